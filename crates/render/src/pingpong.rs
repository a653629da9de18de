//! Ping-pong target pair for the transform chain.
//!
//! Two [`RenderTexture`] slots referenced by a flipping front index. Each
//! applied transform reads the front and writes the back, then the index
//! flips; a no-op transform leaves the index alone, so its step contributes
//! nothing to the final image.

use hdrplay_common::{GpuBackend, RenderError, Resolution};

use crate::target::RenderTexture;

#[derive(Debug, Default)]
pub struct PingPongTargets {
    slots: [RenderTexture; 2],
    front: usize,
}

impl PingPongTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size both slots for the chain. Targets are never resized mid-chain;
    /// this runs once per frame, before the first transform.
    pub fn ensure(
        &mut self,
        backend: &dyn GpuBackend,
        size: Resolution,
        bit_depth: u32,
    ) -> Result<(), RenderError> {
        for slot in &mut self.slots {
            slot.ensure(backend, size, bit_depth)?;
        }
        Ok(())
    }

    pub fn front(&self) -> &RenderTexture {
        &self.slots[self.front]
    }

    pub fn front_mut(&mut self) -> &mut RenderTexture {
        &mut self.slots[self.front]
    }

    /// Borrow (front, back) simultaneously — transform source and destination.
    pub fn pair_mut(&mut self) -> (&mut RenderTexture, &mut RenderTexture) {
        let [a, b] = &mut self.slots;
        if self.front == 0 {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Flip front and back after an applied transform.
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    pub fn destroy(&mut self, backend: &dyn GpuBackend) {
        for slot in &mut self.slots {
            slot.destroy(backend);
        }
        self.front = 0;
    }
}
