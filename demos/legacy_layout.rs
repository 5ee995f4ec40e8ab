//! # Example: legacy_layout
//!
//! Elements on the legacy path, laid out through the built-in [`ResourceTable`].
//!
//! Demonstrates how to:
//! - Share a [`ResourceTable`] between the host and the caller.
//! - Mark resources as displayed and run [`ResourceTable::layout_pending`].
//! - Pause, resume and re-run a pass after an unlayout.
//!
//! ## Flow
//! ```text
//! attach() ──► ResourceTable::add() ──► upgraded() ──► build_internal()
//! set_displayed(id, true)
//! layout_pending() ──► Element::layout_execute() ──► Behavior::layout()
//!                                └─► first pass ─► first_layout_completed()
//! pause() ─► unlayout (if requested) ─► resume() ─► layout_pending() again
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example legacy_layout
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use elementvisor::{
    Behavior, BehaviorClass, BehaviorRef, ElementError, ElementInfo, Host, HostConfig,
    ResourceTable,
};

struct Image {
    name: String,
}

#[async_trait]
impl Behavior for Image {
    async fn build(&self) -> Result<(), ElementError> {
        println!("[{}] build", self.name);
        Ok(())
    }

    async fn layout(&self) -> Result<(), ElementError> {
        println!("[{}] layout", self.name);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(())
    }

    fn unlayout(&self) -> bool {
        println!("[{}] unlayout", self.name);
        true
    }

    fn unlayout_on_pause(&self) -> bool {
        true
    }

    fn first_layout_completed(&self) {
        println!("[{}] first layout completed", self.name);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 1. Keep a handle on the resource table
    let table = ResourceTable::new();
    let host = Host::builder(HostConfig::default())
        .with_resources(table.clone())
        .build();

    host.define(
        "x-img",
        BehaviorClass::new("image", |info: &ElementInfo| {
            Arc::new(Image {
                name: format!("{}#{}", info.tag, info.id),
            }) as BehaviorRef
        }),
    )?;

    // 2. Attach and wait for the builds
    let elements: Vec<_> = (0..2)
        .map(|_| host.create_element("x-img", Default::default()))
        .collect();
    for el in &elements {
        el.attach();
        el.when_built().await?;
    }

    // 3. Only displayed resources are laid out
    if let Some(id) = elements[0].resource_id() {
        table.set_displayed(id, true);
    }
    println!("passes: {}", table.layout_pending().await);
    println!("passes: {}", table.layout_pending().await);

    // 4. Pause unlays out; the next pending pass lays out again
    elements[0].pause();
    elements[0].resume();
    println!("passes after pause: {}", table.layout_pending().await);

    for el in &elements {
        println!("{} is {} ({} passes)", el.id(), el.ready_state(), el.layout_count());
    }
    host.shutdown();
    Ok(())
}
