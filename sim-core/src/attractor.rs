use crate::{error::ConfigError, rng::GrowthRng, types::Point3};
use glam::DVec3;

/// The active attraction points of a simulation.
///
/// Order carries no meaning; removal swaps the last point into the hole.
#[derive(Clone, Debug, Default)]
pub struct AttractorSet {
    pub points: Vec<Point3>,
}

impl AttractorSet {
    pub fn from_positions(positions: Vec<Point3>) -> Result<Self, ConfigError> {
        if let Some(bad) = positions.iter().find(|p| !p.is_finite()) {
            return Err(ConfigError::NonFinitePoint(*bad));
        }
        Ok(Self { points: positions })
    }

    /// Uniformly samples `count` points in the box `center ± half_extents`.
    pub fn random_in_box(
        center: Point3,
        half_extents: DVec3,
        count: usize,
        rng: &mut GrowthRng,
    ) -> Self {
        let points = (0..count)
            .map(|_| {
                let unit = DVec3::new(
                    rng.range(-1.0, 1.0),
                    rng.range(-1.0, 1.0),
                    rng.range(-1.0, 1.0),
                );
                center + unit * half_extents
            })
            .collect();

        Self { points }
    }

    /// Uniformly samples `count` points inside a ball.
    pub fn random_in_sphere(
        center: Point3,
        radius: f64,
        count: usize,
        rng: &mut GrowthRng,
    ) -> Self {
        let points = (0..count)
            .map(|_| {
                // Cube root keeps the density uniform in volume.
                let r = radius * rng.uniform().cbrt();
                center + rng.unit_vector() * r
            })
            .collect();

        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn extend(&mut self, other: Self) {
        self.points.extend(other.points);
    }

    /// Removes every point whose index is listed, in one batch.
    ///
    /// Indices refer to the set as it was before the call. Duplicates and
    /// out-of-range indices are ignored.
    pub fn remove_indices(&mut self, indices: &mut Vec<usize>) {
        // Highest first, so a swapped-in tail point is never itself pending.
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for &i in indices.iter() {
            if i < self.points.len() {
                self.points.swap_remove(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_positions_rejects_nan() {
        let err = AttractorSet::from_positions(vec![DVec3::ZERO, DVec3::new(f64::NAN, 0.0, 0.0)]);
        assert!(matches!(err, Err(ConfigError::NonFinitePoint(_))));
    }

    #[test]
    fn remove_indices_removes_exactly_the_listed_points() {
        let pts: Vec<DVec3> = (0..6).map(|i| DVec3::splat(f64::from(i))).collect();
        let mut set = AttractorSet::from_positions(pts).unwrap();

        let mut doomed = vec![1, 5, 3, 5];
        set.remove_indices(&mut doomed);

        let mut left: Vec<f64> = set.points.iter().map(|p| p.x).collect();
        left.sort_by(f64::total_cmp);
        assert_eq!(left, vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn random_in_box_stays_inside() {
        let mut rng = GrowthRng::from_seed(3);
        let center = DVec3::new(0.0, 0.0, 8.0);
        let set = AttractorSet::random_in_box(center, DVec3::splat(5.0), 200, &mut rng);

        assert_eq!(set.len(), 200);
        for p in &set.points {
            let d = (*p - center).abs();
            assert!(d.max_element() <= 5.0, "{p} outside box");
        }
    }

    #[test]
    fn random_in_sphere_stays_inside() {
        let mut rng = GrowthRng::from_seed(4);
        let set = AttractorSet::random_in_sphere(DVec3::ONE, 2.0, 200, &mut rng);
        for p in &set.points {
            assert!((*p - DVec3::ONE).length() <= 2.0 + 1e-12);
        }
    }
}
