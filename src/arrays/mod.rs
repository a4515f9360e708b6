//! Multidimensional arrays backed by one flat buffer.

use hashbrown::HashSet;

use crate::{coords::Coordinates, region::Region, Error, Result, Value};

mod anisotropic;
pub use anisotropic::{cone_volume, Anisotropic, ConeWalk};

mod rectangular;
pub use rectangular::Rectangular;

mod square;
pub use square::Square;

/// A lazily evaluated sequence of positions on the edge of a shape.
pub type EdgePositions<'a> = Box<dyn Iterator<Item = Coordinates> + 'a>;

/// The shape of a multidimensional array: which positions it has, and
/// where each of them is stored in the flat buffer.
pub trait Shape: Region + Clone {
    /// The amount of positions in the shape.
    fn volume(&self) -> usize;

    /// The index into the flat buffer at which `coordinates` is stored.
    ///
    /// The result is not defined if `coordinates` is outside the shape or
    /// has a different dimension.
    fn index(&self, coordinates: &Coordinates) -> usize;

    /// Iterate over the positions within `width` of the edges of the shape.
    fn edge_positions(&self, width: usize) -> Result<EdgePositions<'_>>;
}

/// Check that every position of `shape` maps to its own storage slot, and
/// that all of the slots are used.
pub fn is_bijective<S: Shape>(shape: &S) -> bool {
    let volume = shape.volume();
    let mut seen = HashSet::with_capacity(volume);

    for c in shape.positions() {
        let index = shape.index(&c);
        if index >= volume || !seen.insert(index) {
            return false;
        }
    }

    seen.len() == volume
}

/// A multidimensional array of [`Value`]s with shape `S`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NdArray<S> {
    shape: S,
    values: Vec<Value>,
}

impl<S> NdArray<S>
where
    S: Shape,
{
    /// Create a new array of shape `shape` with all values set to zero.
    pub fn new(shape: S) -> Self {
        Self::filled(shape, 0)
    }

    /// Create a new array of shape `shape` with all values set to `value`.
    pub fn filled(shape: S, value: Value) -> Self {
        #[cfg(feature = "diagnostics")]
        if !is_bijective(&shape) {
            panic!(
                "Shape of dimension {} does not map its positions one to one",
                shape.dimension()
            );
        }

        let values = vec![value; shape.volume()];
        Self { shape, values }
    }

    /// Create an array of shape `shape` from values in storage order.
    pub fn from_values(shape: S, values: Vec<Value>) -> Result<Self> {
        if values.len() != shape.volume() {
            return Err(Error::LengthMismatch {
                expected: shape.volume(),
                got: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    pub fn dimension(&self) -> usize {
        self.shape.dimension()
    }

    /// The values in storage order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    fn slot(&self, coordinates: &Coordinates) -> usize {
        debug_assert_eq!(coordinates.count(), self.shape.dimension());
        #[cfg(feature = "diagnostics")]
        if !self.shape.contains(coordinates) {
            panic!("{coordinates} is outside of the array");
        }
        self.shape.index(coordinates)
    }

    pub fn get(&self, coordinates: &Coordinates) -> Value {
        self.values[self.slot(coordinates)]
    }

    pub fn set(&mut self, coordinates: &Coordinates, value: Value) {
        let slot = self.slot(coordinates);
        self.values[slot] = value;
    }

    /// Add `delta` to the value at `coordinates` and return the result.
    pub fn add_and_get(&mut self, coordinates: &Coordinates, delta: Value) -> Value {
        let slot = self.slot(coordinates);
        self.values[slot] += delta;
        self.values[slot]
    }

    pub fn set_all(&mut self, value: Value) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    /// Set every position within `width` of the edges to `value`.
    pub fn pad_edges(&mut self, width: usize, value: Value) -> Result<()> {
        let slots: Vec<usize> = self
            .shape
            .edge_positions(width)?
            .map(|c| self.shape.index(&c))
            .collect();

        for slot in slots {
            self.values[slot] = value;
        }

        Ok(())
    }

    /// The sum of every stored value.
    pub fn total(&self) -> Value {
        self.values.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_add() {
        let mut array = NdArray::new(Square::new(2, 3).unwrap());
        let c = Coordinates::from([2, 1]);

        array.set(&c, 4);
        assert_eq!(array.get(&c), 4);
        assert_eq!(array.add_and_get(&c, -6), -2);
        assert_eq!(array.total(), -2);
    }

    #[test]
    fn pad_cone_edges() {
        let mut array = NdArray::new(Anisotropic::new(2, 4).unwrap());
        array.pad_edges(1, 7).unwrap();

        for c in array.shape().storage_order() {
            let expected = if c.get(0) == 3 { 7 } else { 0 };
            assert_eq!(array.get(&c), expected, "{c}");
        }
    }

    #[test]
    fn set_all_then_pad() {
        let mut array = NdArray::new(Rectangular::new(vec![3, 4]).unwrap());
        array.set_all(-2);
        assert_eq!(array.total(), -24);

        array.pad_edges(1, 0).unwrap();
        assert_eq!(array.total(), -4);
        assert_eq!(array.get(&[1, 2].into()), -2);
    }

    #[test]
    fn pad_square_edges() {
        let mut array = NdArray::filled(Square::new(2, 4).unwrap(), 1);
        array.pad_edges(1, 0).unwrap();
        assert_eq!(array.total(), 4);
    }

    #[test]
    fn from_values_checks_length() {
        let shape = Anisotropic::new(3, 2).unwrap();
        assert!(NdArray::from_values(shape.clone(), vec![1; 4]).is_ok());
        assert!(matches!(
            NdArray::from_values(shape, vec![1; 5]),
            Err(Error::LengthMismatch {
                expected: 4,
                got: 5
            })
        ));
    }
}
