//! Fixed set of chip slots and the output mixer.
use std::fmt;

use tracing::info;

use crate::chip::adapter::{ChipAdapter, DualChipAdapter, StereoFrame};
use crate::chip::engine::EngineFactory;
use crate::chip::kind::ChipKind;
use crate::chip::{CLOCK_MASK, Instance};

/// One [`DualChipAdapter`] per [`ChipKind`], plus the factory used to create
/// engines when a slot is activated.
pub struct ChipRack {
    slots: [DualChipAdapter; ChipKind::COUNT],
    factory: Box<dyn EngineFactory>,
}

impl fmt::Debug for ChipRack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChipRack")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl ChipRack {
    pub fn new(factory: Box<dyn EngineFactory>) -> Self {
        ChipRack {
            slots: std::array::from_fn(|_| DualChipAdapter::new()),
            factory,
        }
    }

    /// Activate `kind` from a raw header clock field.
    ///
    /// Returns `false` when the slot was already active; a slot is activated
    /// at most once per session.
    pub fn activate(&mut self, kind: ChipKind, raw_clock: u32) -> bool {
        let slot = &mut self.slots[kind.index()];
        if slot.chip(Instance::Primary).is_enabled() {
            return false;
        }
        let factory = &self.factory;
        let count = slot.init(raw_clock, || factory.create(kind));
        info!(
            "{} detected, clock {} Hz{}",
            kind,
            raw_clock & CLOCK_MASK,
            if count > 1 { " (dual)" } else { "" }
        );
        count > 0
    }

    pub fn is_active(&self, kind: ChipKind) -> bool {
        self.slots[kind.index()]
            .chip(Instance::Primary)
            .is_enabled()
    }

    pub fn slot(&self, kind: ChipKind) -> &DualChipAdapter {
        &self.slots[kind.index()]
    }

    pub fn slot_mut(&mut self, kind: ChipKind) -> &mut DualChipAdapter {
        &mut self.slots[kind.index()]
    }

    pub fn adapter_mut(&mut self, kind: ChipKind, instance: Instance) -> &mut ChipAdapter {
        self.slots[kind.index()].chip_mut(instance)
    }

    /// Every enabled instance with its clock, in mixing order.
    pub fn active_chips(&self) -> Vec<(ChipKind, Instance, u32)> {
        let mut out = Vec::new();
        for kind in ChipKind::ALL {
            for instance in [Instance::Primary, Instance::Secondary] {
                let chip = self.slots[kind.index()].chip(instance);
                if chip.is_enabled() {
                    out.push((kind, instance, chip.clock()));
                }
            }
        }
        out
    }

    /// Produce one mixed output frame from every active chip.
    pub fn mix(&mut self) -> StereoFrame {
        let mut total = [0i32, 0i32];
        for slot in self.slots.iter_mut() {
            slot.mix_into(&mut total);
        }
        // mix_into already keeps the total inside the i16 range
        [total[0] as i16, total[1] as i16]
    }
}
