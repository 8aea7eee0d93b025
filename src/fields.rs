//! Named scalar fields for telemetry.
//!
//! Loggers walk a value through [`Fields::visit_fields`] and get every scalar
//! together with a stable name, always in declaration order. Encoding the
//! result is up to the caller. The scalar type is per implementor, so `f32`
//! attitude types and `f64` filter states go through the same visitors.

use crate::attitude::{Euler, Quaternion};

pub trait FieldVisitor<T> {
    fn visit(&mut self, name: &'static str, value: T);
}

impl<T, F: FnMut(&'static str, T)> FieldVisitor<T> for F {
    fn visit(&mut self, name: &'static str, value: T) {
        self(name, value)
    }
}

/// Visitor that may overwrite fields, e.g. when replaying a log
pub trait FieldVisitorMut<T> {
    fn visit(&mut self, name: &'static str, value: &mut T);
}

impl<T, F: FnMut(&'static str, &mut T)> FieldVisitorMut<T> for F {
    fn visit(&mut self, name: &'static str, value: &mut T) {
        self(name, value)
    }
}

pub trait Fields {
    type Value: Copy;

    fn visit_fields<V: FieldVisitor<Self::Value>>(&self, visitor: &mut V);

    fn visit_fields_mut<V: FieldVisitorMut<Self::Value>>(&mut self, visitor: &mut V);

    /// Collects `(name, value)` pairs, `None` if there are more than `K` fields
    fn field_pairs<const K: usize>(
        &self,
    ) -> Option<heapless::Vec<(&'static str, Self::Value), K>> {
        let mut pairs: heapless::Vec<(&'static str, Self::Value), K> = heapless::Vec::new();
        let mut overflow = false;

        self.visit_fields(&mut |name: &'static str, value: Self::Value| {
            if pairs.push((name, value)).is_err() {
                overflow = true;
            }
        });

        (!overflow).then_some(pairs)
    }
}

impl Fields for Quaternion {
    type Value = f32;

    fn visit_fields<V: FieldVisitor<f32>>(&self, visitor: &mut V) {
        visitor.visit("w", self.w);
        visitor.visit("x", self.x);
        visitor.visit("y", self.y);
        visitor.visit("z", self.z);
    }

    fn visit_fields_mut<V: FieldVisitorMut<f32>>(&mut self, visitor: &mut V) {
        visitor.visit("w", &mut self.w);
        visitor.visit("x", &mut self.x);
        visitor.visit("y", &mut self.y);
        visitor.visit("z", &mut self.z);
    }
}

impl Fields for Euler {
    type Value = f32;

    fn visit_fields<V: FieldVisitor<f32>>(&self, visitor: &mut V) {
        visitor.visit("roll", self.roll);
        visitor.visit("pitch", self.pitch);
        visitor.visit("yaw", self.yaw);
    }

    fn visit_fields_mut<V: FieldVisitorMut<f32>>(&mut self, visitor: &mut V) {
        visitor.visit("roll", &mut self.roll);
        visitor.visit("pitch", &mut self.pitch);
        visitor.visit("yaw", &mut self.yaw);
    }
}
