//! Boolean conditions the command scheduler binds commands to.
//!
//! A [`Trigger`] is a handle: cloning it yields the *same* trigger, and the
//! scheduler tracks edge state per trigger identity ([`TriggerKey`]). Two
//! triggers built separately for the same button are two independent state
//! machines, which is why the controller hands out memoized instances.

use std::fmt;
use std::rc::Rc;

use crate::controller::controller_handle::{ControllerError, XboxAxis, XboxController};

/// Identity of a trigger instance, stable for as long as any clone is alive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerKey(usize);

struct TriggerInner {
    label: String,
    condition: Box<dyn Fn() -> bool>,
}

#[derive(Clone)]
pub struct Trigger {
    inner: Rc<TriggerInner>,
}

impl Trigger {
    pub fn new(label: impl Into<String>, condition: impl Fn() -> bool + 'static) -> Self {
        Self {
            inner: Rc::new(TriggerInner {
                label: label.into(),
                condition: Box::new(condition),
            }),
        }
    }

    /// Current level of the condition
    pub fn get(&self) -> bool {
        (self.inner.condition)()
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn key(&self) -> TriggerKey {
        TriggerKey(Rc::as_ptr(&self.inner) as usize)
    }

    /// True when both handles refer to the same trigger instance
    pub fn ptr_eq(&self, other: &Trigger) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn and(&self, other: &Trigger) -> Trigger {
        let (lhs, rhs) = (self.clone(), other.clone());
        Trigger::new(format!("({} && {})", self.label(), other.label()), move || {
            lhs.get() && rhs.get()
        })
    }

    pub fn or(&self, other: &Trigger) -> Trigger {
        let (lhs, rhs) = (self.clone(), other.clone());
        Trigger::new(format!("({} || {})", self.label(), other.label()), move || {
            lhs.get() || rhs.get()
        })
    }

    pub fn negate(&self) -> Trigger {
        let inner = self.clone();
        Trigger::new(format!("!{}", self.label()), move || !inner.get())
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("label", &self.inner.label)
            .field("key", &self.key())
            .finish()
    }
}

/// `|axis| >= threshold` on one analog axis.
///
/// Equality covers both the axis and the threshold: the same axis with another
/// threshold is a different logical input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisThreshold {
    axis: XboxAxis,
    threshold: f64,
}

impl AxisThreshold {
    /// Rejects thresholds an axis reading could never be meaningfully
    /// compared against (NaN, negative, above full deflection).
    pub fn new(axis: XboxAxis, threshold: f64) -> Result<Self, ControllerError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ControllerError::InvalidThreshold { axis, threshold });
        }
        Ok(Self { axis, threshold })
    }

    pub fn axis(&self) -> XboxAxis {
        self.axis
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_active(&self, value: f64) -> bool {
        value.abs() >= self.threshold
    }

    pub fn into_trigger(self, controller: XboxController) -> Trigger {
        Trigger::new(
            format!("{:?} >= {}", self.axis, self.threshold),
            move || self.is_active(controller.raw_axis(self.axis)),
        )
    }
}
