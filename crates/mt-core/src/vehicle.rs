//! Vehicle class variants and per-class accumulators.
//!
//! Every live vehicle has exactly one `VehicleClass`, fixed when it is
//! created.  Class-level conventions (AVs emit no CO2) are expressed as
//! methods on the enum so that callers never re-derive them from measurements.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::MtError;

/// The two simulated vehicle populations.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VehicleClass {
    /// Autonomous vehicle: zero-emission, perfect-control.
    Av,
    /// Human-driven combustion vehicle.
    Conventional,
}

impl VehicleClass {
    /// Both classes, in report order.
    pub const ALL: [VehicleClass; 2] = [VehicleClass::Av, VehicleClass::Conventional];

    /// Emission policy.  AVs are zero-emission by definition of the
    /// experiment; their emission rate is never queried from the simulator.
    #[inline]
    pub const fn emits_co2(self) -> bool {
        match self {
            VehicleClass::Av           => false,
            VehicleClass::Conventional => true,
        }
    }

    /// Vehicle-type id used by the simulator's route/type definitions.
    pub const fn type_id(self) -> &'static str {
        match self {
            VehicleClass::Av           => "autonomous_car",
            VehicleClass::Conventional => "gasoline_car",
        }
    }

    /// Short label, useful for CSV column values.
    pub const fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Av           => "av",
            VehicleClass::Conventional => "conventional",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = MtError;

    /// Accepts both the short labels and the simulator type ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "av" | "autonomous_car"               => Ok(VehicleClass::Av),
            "conventional" | "gasoline_car"       => Ok(VehicleClass::Conventional),
            other => Err(MtError::Parse(format!("unknown vehicle class {other:?}"))),
        }
    }
}

// ── PerClass ──────────────────────────────────────────────────────────────────

/// A pair of values, one per [`VehicleClass`], indexable by class.
///
/// ```rust,ignore
/// let mut mass: PerClass<f64> = PerClass::default();
/// mass[VehicleClass::Conventional] += 12.5;
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerClass<T> {
    pub av:           T,
    pub conventional: T,
}

impl<T> PerClass<T> {
    pub fn new(av: T, conventional: T) -> Self {
        Self { av, conventional }
    }

    /// Apply `f` to both values.
    pub fn map<U>(&self, mut f: impl FnMut(VehicleClass, &T) -> U) -> PerClass<U> {
        PerClass {
            av:           f(VehicleClass::Av, &self.av),
            conventional: f(VehicleClass::Conventional, &self.conventional),
        }
    }
}

impl<T: Copy + std::ops::Add<Output = T>> PerClass<T> {
    /// Sum across both classes.
    pub fn total(&self) -> T {
        self.av + self.conventional
    }
}

impl<T> Index<VehicleClass> for PerClass<T> {
    type Output = T;
    #[inline]
    fn index(&self, class: VehicleClass) -> &T {
        match class {
            VehicleClass::Av           => &self.av,
            VehicleClass::Conventional => &self.conventional,
        }
    }
}

impl<T> IndexMut<VehicleClass> for PerClass<T> {
    #[inline]
    fn index_mut(&mut self, class: VehicleClass) -> &mut T {
        match class {
            VehicleClass::Av           => &mut self.av,
            VehicleClass::Conventional => &mut self.conventional,
        }
    }
}
