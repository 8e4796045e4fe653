//! Ambient temperature providers.

use std::cell::Cell;
use std::rc::Rc;

use ts_core::numeric::Real;

/// Supplies the ambient temperature [°C] seen by a component.
pub trait AmbientSource {
    fn temperature(&self) -> Real;
}

/// Fixed ambient temperature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantAmbient(pub Real);

impl AmbientSource for ConstantAmbient {
    fn temperature(&self) -> Real {
        self.0
    }
}

/// Ambient value shared by several components and updated by the driver
/// between steps.
#[derive(Clone, Debug, Default)]
pub struct SharedAmbient(Rc<Cell<Real>>);

impl SharedAmbient {
    pub fn new(t: Real) -> Self {
        Self(Rc::new(Cell::new(t)))
    }

    pub fn set(&self, t: Real) {
        self.0.set(t);
    }
}

impl AmbientSource for SharedAmbient {
    fn temperature(&self) -> Real {
        self.0.get()
    }
}
