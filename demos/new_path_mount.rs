//! # Example: new_path_mount
//!
//! Elements on the new execution path mounted by the built-in [`QueueScheduler`].
//!
//! Demonstrates how to:
//! - Define a behavior class whose mount reports a loading phase.
//! - Cap concurrent mounts with `HostConfig::max_concurrent_mounts`.
//! - Queue an action before the build and watch it flush afterwards.
//! - Remove an element while its mount is still loading.
//!
//! ## Flow
//! ```text
//! attach() ──► Scheduler::schedule() ──► QueueScheduler loop (permit)
//!                                              └─► Element::mount()
//!                                                    ├─► build (flush actions)
//!                                                    ├─► Behavior::mount() ─► Loading
//!                                                    └─► signal Mounted ─► Complete
//! remove_element() ──► unmount + dispose (pending handles settle with Disposed)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example new_path_mount
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use elementvisor::{
    ActionInvocation, Behavior, BehaviorClass, BehaviorRef, ElementError, ElementInfo, Host,
    HostConfig, LogWriter, MountOutcome, Subscribe,
};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

struct Video {
    name: String,
}

#[async_trait]
impl Behavior for Video {
    async fn build(&self) -> Result<(), ElementError> {
        println!("[{}] build", self.name);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }

    fn mount(&self, token: CancellationToken) -> Result<MountOutcome, ElementError> {
        println!("[{}] mount", self.name);
        let name = self.name.clone();
        let loading = async move {
            tokio::select! {
                _ = token.cancelled() => println!("[{name}] loading cancelled"),
                _ = tokio::time::sleep(Duration::from_millis(200)) => println!("[{name}] loaded"),
            }
            Ok(())
        };
        Ok(MountOutcome::Loading(loading.boxed()))
    }

    fn unmount(&self) {
        println!("[{}] unmount", self.name);
    }

    fn uses_loading(&self) -> bool {
        true
    }

    fn is_new_execution_path(&self) -> bool {
        true
    }

    fn execute_action(
        &self,
        invocation: &ActionInvocation,
        deferred: bool,
    ) -> Result<(), ElementError> {
        println!("[{}] action {} (deferred: {deferred})", self.name, invocation.method);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 1. At most two mounts in flight
    let cfg = HostConfig {
        max_concurrent_mounts: 2,
        ..HostConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let host = Host::builder(cfg).with_subscribers(subs).build();

    // 2. Define the class
    host.define(
        "x-video",
        BehaviorClass::new("video", |info: &ElementInfo| {
            Arc::new(Video {
                name: format!("{}#{}", info.tag, info.id),
            }) as BehaviorRef
        }),
    )?;

    // 3. Create elements; the first one gets an action before its build
    let elements: Vec<_> = (0..3)
        .map(|_| host.create_element("x-video", Default::default()))
        .collect();
    elements[0].enqueue(ActionInvocation::new("play"))?;
    for el in &elements {
        el.attach();
    }

    // 4. Wait for the first two, then drop the third mid-flight
    elements[0].when_mounted().await?;
    elements[1].when_mounted().await?;
    host.remove_element(elements[2].id())?;
    let outcome = elements[2].mount().await;
    println!("[removed] mount handle settled with {outcome:?}");

    for el in &elements {
        println!("{} is {}", el.id(), el.ready_state());
    }
    host.shutdown();
    Ok(())
}
