use crate::{
    automata::ValueAt,
    coords::{Coordinates, PartialCoordinates},
    region::Region,
    Error, Result, Value,
};

/// A two dimensional slice through a model: every axis but `horizontal` and
/// `vertical` is held at a fixed coordinate.
///
/// Coordinate 0 of the section maps to `horizontal` and coordinate 1 to
/// `vertical`.
pub struct CrossSection2D<'a, M> {
    model: &'a M,
    horizontal: usize,
    vertical: usize,
    fixed: Coordinates,
}

impl<'a, M> CrossSection2D<'a, M>
where
    M: Region + ValueAt,
{
    /// Create a section through `model`. The coordinates of `fixed` on
    /// `horizontal` and `vertical` are ignored.
    pub fn new(model: &'a M, horizontal: usize, vertical: usize, fixed: Coordinates) -> Result<Self> {
        let dimension = model.dimension();

        if horizontal == vertical || horizontal >= dimension || vertical >= dimension {
            return Err(Error::InvalidCrossSection {
                horizontal,
                vertical,
                dimension,
            });
        }

        if fixed.count() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                got: fixed.count(),
            });
        }

        Ok(Self {
            model,
            horizontal,
            vertical,
            fixed,
        })
    }

    /// The section through the origin.
    pub fn through_origin(model: &'a M, horizontal: usize, vertical: usize) -> Result<Self> {
        let origin = Coordinates::origin(model.dimension());
        Self::new(model, horizontal, vertical, origin)
    }

    fn model_axis(&self, axis: usize) -> usize {
        if axis == 0 {
            self.horizontal
        } else {
            self.vertical
        }
    }

    /// The position in the model of the section position `coordinates`.
    pub fn lift(&self, coordinates: &Coordinates) -> Coordinates {
        self.fixed
            .with(self.horizontal, coordinates.get(0))
            .with(self.vertical, coordinates.get(1))
    }

    /// Render the section as text, one row per vertical coordinate from the
    /// top down, values right aligned.
    pub fn render_text(&self) -> String {
        let (left, right) = (self.global_lower_bound(0), self.global_upper_bound(0));
        let (bottom, top) = (self.global_lower_bound(1), self.global_upper_bound(1));

        let rows: Vec<Vec<Value>> = (bottom..=top)
            .rev()
            .map(|y| {
                (left..=right)
                    .map(|x| self.value_at(&Coordinates::from([x, y])))
                    .collect()
            })
            .collect();

        let width = rows
            .iter()
            .flatten()
            .map(|v| v.to_string().len())
            .max()
            .unwrap_or(1);

        let mut out = String::new();
        for row in rows {
            let line: Vec<String> = row.iter().map(|v| format!("{v:>width$}")).collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

impl<'a, M> Region for CrossSection2D<'a, M>
where
    M: Region + ValueAt,
{
    fn dimension(&self) -> usize {
        2
    }

    fn upper_bound(&self, axis: usize, _: &PartialCoordinates) -> isize {
        self.model.global_upper_bound(self.model_axis(axis))
    }

    fn lower_bound(&self, axis: usize, _: &PartialCoordinates) -> isize {
        self.model.global_lower_bound(self.model_axis(axis))
    }
}

impl<'a, M> ValueAt for CrossSection2D<'a, M>
where
    M: Region + ValueAt,
{
    fn value_at(&self, coordinates: &Coordinates) -> Value {
        self.model.value_at(&self.lift(coordinates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::{CellularAutomaton, SimpleSpreadIntegerValue, SimulationConfig, SpreadIntegerValue};

    #[test]
    fn one_step_in_two_dimensions() {
        let mut model = SpreadIntegerValue::new(SimulationConfig::new(2, 10, 0)).unwrap();
        model.next_step().unwrap();

        let section = CrossSection2D::through_origin(&model, 0, 1).unwrap();
        assert_eq!(
            section.render_text(),
            "0 0 0 0 0\n0 0 2 0 0\n0 2 2 2 0\n0 0 2 0 0\n0 0 0 0 0\n"
        );
    }

    #[test]
    fn sections_of_both_models_match() {
        let config = SimulationConfig::new(3, 700, 0);
        let mut full = SimpleSpreadIntegerValue::new(config).unwrap();
        let mut reduced = SpreadIntegerValue::new(config).unwrap();
        for _ in 0..8 {
            full.next_step().unwrap();
            reduced.next_step().unwrap();
        }

        let fixed = Coordinates::from([0, 0, 1]);
        let a = CrossSection2D::new(&full, 1, 0, fixed.clone()).unwrap();
        let b = CrossSection2D::new(&reduced, 1, 0, fixed).unwrap();
        assert_eq!(a.render_text(), b.render_text());
    }

    #[test]
    fn lift_places_the_section_axes() {
        let model = SpreadIntegerValue::new(SimulationConfig::new(3, 1, 0)).unwrap();
        let section = CrossSection2D::new(&model, 2, 0, [9, 8, 7].into()).unwrap();

        assert_eq!(section.lift(&[1, -1].into()), Coordinates::from([-1, 8, 1]));
    }

    #[test]
    fn invalid_axes() {
        let model = SpreadIntegerValue::new(SimulationConfig::new(2, 1, 0)).unwrap();

        assert!(matches!(
            CrossSection2D::through_origin(&model, 1, 1),
            Err(Error::InvalidCrossSection { .. })
        ));
        assert!(matches!(
            CrossSection2D::through_origin(&model, 0, 2),
            Err(Error::InvalidCrossSection { .. })
        ));
        assert!(matches!(
            CrossSection2D::new(&model, 0, 1, [0, 0, 0].into()),
            Err(Error::DimensionMismatch { expected: 2, got: 3 })
        ));
    }
}
