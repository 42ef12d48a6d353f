use ball::{Ball, BallMat};
use rug::Float;
use sampling::{distributions::FormSampler, source::Source};

use crate::{
    eld::{Coset, EllipsoidTree},
    error::EnumError,
    params::Parameters,
};

/// Relative slack between the certified enclosure and an f64 recomputation.
const SLACK: f64 = 1e-4;

pub(crate) struct RandomEllipsoid {
    pub(crate) g: usize,
    pub(crate) c: Vec<f64>,
    pub(crate) v: Vec<f64>,
    pub(crate) r2: f64,
}

impl RandomEllipsoid {
    pub(crate) fn sample(source: &mut Source, g: usize, r2: f64) -> Self {
        let sampler: FormSampler = FormSampler::default();
        let c: Vec<f64> = sampler.sample_upper(source, g);
        let v: Vec<f64> = sampler.sample_offset(source, g, 1.0);
        RandomEllipsoid { g, c, v, r2 }
    }

    pub(crate) fn build(&self, params: &Parameters, coset: Coset) -> Result<EllipsoidTree, EnumError> {
        let c: BallMat = BallMat::from_f64(self.g, self.g, &self.c);
        let v: Vec<Ball> = self.v.iter().map(|x| Ball::from_f64(*x)).collect();
        EllipsoidTree::build(params, &c, &Float::with_val(53, self.r2), &v, coset)
    }

    /// `|C n + v|^2` in f64.
    pub(crate) fn norm2(&self, n: &[i64]) -> f64 {
        let g: usize = self.g;
        (0..g)
            .map(|i| {
                let x: f64 = (i..g).map(|j| self.c[i * g + j] * n[j] as f64).sum::<f64>() + self.v[i];
                x * x
            })
            .sum()
    }

    /// Per-coordinate bounds on the points of the ellipsoid, by back substitution.
    pub(crate) fn coord_bounds(&self) -> Vec<i64> {
        let g: usize = self.g;
        let r: f64 = self.r2.sqrt();
        let mut bounds: Vec<f64> = vec![0.0; g];
        for i in (0..g).rev() {
            let off: f64 = (i + 1..g).map(|j| self.c[i * g + j].abs() * bounds[j]).sum::<f64>();
            bounds[i] = (r + self.v[i].abs() + off) / self.c[i * g + i];
        }
        bounds.iter().map(|b| b.ceil() as i64 + 1).collect()
    }

    /// Every integer point of the box returned by [`Self::coord_bounds`].
    pub(crate) fn box_points(&self) -> Vec<Vec<i64>> {
        let bounds: Vec<i64> = self.coord_bounds();
        let mut out: Vec<Vec<i64>> = vec![Vec::new()];
        for b in bounds.iter() {
            out = out
                .into_iter()
                .flat_map(|p| {
                    (-b..=*b).map(move |x| {
                        let mut q: Vec<i64> = p.clone();
                        q.push(x);
                        q
                    })
                })
                .collect();
        }
        out
    }
}

/// The tree holds every point of the coset strictly inside the ellipsoid and
/// nothing clearly outside it.
pub(crate) fn test_enumeration_is_complete(params: &Parameters, g: usize, r2: f64, coset: Coset, seed: u8) {
    let mut source: Source = Source::new([seed; 32]);
    let ell: RandomEllipsoid = RandomEllipsoid::sample(&mut source, g, r2);
    let tree: EllipsoidTree = ell.build(params, coset).unwrap();

    let mut inside: u64 = 0;
    for p in ell.box_points().iter() {
        let q: f64 = ell.norm2(p);
        let contained: bool = tree.contains(p);
        if coset.contains(p) && q <= r2 * (1.0 - SLACK) {
            assert!(contained, "missing {p:?}: |Cn+v|^2={q} <= {r2}");
        }
        if q > r2 * (1.0 + SLACK) || !coset.contains(p) {
            assert!(!contained, "spurious {p:?}: |Cn+v|^2={q} > {r2}");
        }
        inside += contained as u64;
    }
    assert_eq!(inside, tree.nb_pts());
}

/// `points()` lists exactly `nb_pts` distinct members, `border()` lists
/// `nb_border` non-members outside the ellipsoid, and the bounding box is tight.
pub(crate) fn test_counts_are_consistent(params: &Parameters, g: usize, r2: f64, coset: Coset, seed: u8) {
    let mut source: Source = Source::new([seed; 32]);
    let ell: RandomEllipsoid = RandomEllipsoid::sample(&mut source, g, r2);
    let tree: EllipsoidTree = ell.build(params, coset).unwrap();

    let mut points: Vec<Vec<i64>> = tree.points();
    assert_eq!(points.len() as u64, tree.nb_pts());
    let mut bbox: Vec<i64> = vec![0; g];
    for p in points.iter() {
        assert!(tree.contains(p), "{p:?}");
        assert!(coset.contains(p), "{p:?}");
        bbox.iter_mut().zip(p.iter()).for_each(|(b, x)| *b = (*b).max(x.abs()));
    }
    assert_eq!(bbox.as_slice(), tree.bbox());
    points.sort();
    points.dedup();
    assert_eq!(points.len() as u64, tree.nb_pts());

    let border: Vec<Vec<i64>> = tree.border();
    assert_eq!(border.len() as u64, tree.nb_border());
    for p in border.iter() {
        assert!(!tree.contains(p), "{p:?}");
        assert!(coset.contains(p), "{p:?}");
        assert!(ell.norm2(p) > r2 * (1.0 - SLACK), "{p:?} is inside");
    }
}

pub(crate) fn test_build_is_deterministic(params: &Parameters, g: usize, r2: f64, seed: u8) {
    let mut source: Source = Source::new([seed; 32]);
    let ell: RandomEllipsoid = RandomEllipsoid::sample(&mut source, g, r2);
    let a: u64 = source.next_bits(g);
    let first: EllipsoidTree = ell.build(params, Coset::Parity(a)).unwrap();
    let second: EllipsoidTree = ell.build(params, Coset::Parity(a)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.points(), second.points());
}

/// A ceiling just below the point count makes the build fail; the count
/// itself is accepted.
pub(crate) fn test_point_ceiling(params: &Parameters, g: usize, r2: f64, seed: u8) {
    let mut source: Source = Source::new([seed; 32]);
    let ell: RandomEllipsoid = RandomEllipsoid::sample(&mut source, g, r2);
    let nb_pts: u64 = ell.build(params, Coset::Full).unwrap().nb_pts();
    assert!(nb_pts > 1);

    let exact: Parameters = params.with_max_pts(nb_pts);
    assert_eq!(ell.build(&exact, Coset::Full).unwrap().nb_pts(), nb_pts);

    let tight: Parameters = params.with_max_pts(nb_pts - 1);
    assert_eq!(
        ell.build(&tight, Coset::Full).unwrap_err(),
        EnumError::TooManyPoints { limit: nb_pts - 1 }
    );
}

/// A slab `|1000 n_0 + 500| <= 3` thin enough to contain no lattice point:
/// every leaf is empty, so only the arena grows with `scale^2`.
fn empty_slab(scale: f64) -> RandomEllipsoid {
    RandomEllipsoid {
        g: 3,
        c: vec![1000.0, 0.0, 0.0, 0.0, scale, 0.0, 0.0, 0.0, scale],
        v: vec![500.0, 0.0, 0.0],
        r2: 9.0,
    }
}

/// Empty slices count against the ceiling even though `nb_pts` stays zero.
pub(crate) fn test_empty_slices_are_bounded(params: &Parameters) {
    let limited: Parameters = params.with_max_pts(1000);

    // About 120 empty leaves: within g * max_pts.
    let small: EllipsoidTree = empty_slab(0.5).build(&limited, Coset::Full).unwrap();
    assert_eq!(small.nb_pts(), 0);
    assert!(small.nb_nodes() > 100);

    // About 280k empty leaves.
    assert_eq!(
        empty_slab(0.01).build(&limited, Coset::Full).unwrap_err(),
        EnumError::TooManyPoints { limit: 1000 }
    );
}
