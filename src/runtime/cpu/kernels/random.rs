//! Stream-partitioned random generation
//!
//! Element `i` draws from stream `i % streams`. Each call reseeds a stream's
//! generator from its state word, walks that stream's elements in order, then
//! stores a fresh word so the next call continues the sequence.

use super::{Fault, KernelResult, ensure, load, store};
use crate::runtime::{ArenaAllocator, MatDesc, RngStreams, SampleOp, Status};
use rand::distr::Open01;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Poisson, StandardNormal};

pub(crate) fn init_random(streams: &mut RngStreams, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for word in streams.words.iter_mut() {
        *word = rng.next_u64();
    }
}

/// Produce `len` values, element `i` computed by `f(rng_of_stream, i)`
fn draw<F>(streams: &mut RngStreams, len: usize, mut f: F) -> KernelResult<Vec<f32>>
where
    F: FnMut(&mut StdRng, usize) -> f32,
{
    if streams.is_empty() {
        return Err(Fault::Device("random generator has no streams".to_string()));
    }
    let n = streams.len();
    let mut out = vec![0.0; len];
    for (s, word) in streams.words.iter_mut().enumerate().take(len) {
        let mut rng = StdRng::seed_from_u64(*word);
        for i in (s..len).step_by(n) {
            out[i] = f(&mut rng, i);
        }
        *word = rng.next_u64();
    }
    Ok(out)
}

#[inline]
fn uniform(rng: &mut StdRng) -> f32 {
    rng.sample(Open01)
}

pub(crate) fn fill_with_rand(
    arena: &ArenaAllocator,
    streams: &mut RngStreams,
    mat: &MatDesc,
) -> KernelResult {
    let out = draw(streams, mat.len(), |rng, _| uniform(rng))?;
    store(arena, mat, &out)
}

pub(crate) fn fill_with_randn(
    arena: &ArenaAllocator,
    streams: &mut RngStreams,
    mat: &MatDesc,
) -> KernelResult {
    let out = draw(streams, mat.len(), |rng, _| rng.sample(StandardNormal))?;
    store(arena, mat, &out)
}

fn poisson(rng: &mut StdRng, rate: f32) -> f32 {
    if rate.is_nan() || rate <= 0.0 {
        return 0.0;
    }
    match Poisson::new(rate) {
        Ok(dist) => rng.sample(dist),
        Err(_) => f32::NAN,
    }
}

pub(crate) fn sample(
    arena: &ArenaAllocator,
    streams: &mut RngStreams,
    op: SampleOp,
    src: &MatDesc,
    target: &MatDesc,
) -> KernelResult {
    ensure(src.same_size(target), Status::INCOMPATIBLE_DIMENSIONS)?;
    ensure(src.is_trans == target.is_trans, Status::TRANSPOSEDNESS)?;
    let x = load(arena, src)?;
    let out = draw(streams, x.len(), |rng, i| match op {
        SampleOp::Bernoulli => {
            if uniform(rng) < x[i] {
                1.0
            } else {
                0.0
            }
        }
        SampleOp::BernoulliSymmetric => {
            if uniform(rng) < (1.0 + x[i]) / 2.0 {
                1.0
            } else {
                -1.0
            }
        }
        SampleOp::Poisson => poisson(rng, x[i]),
        SampleOp::GaussianNoise { mult } => {
            let n: f32 = rng.sample(StandardNormal);
            x[i] + mult * n
        }
        SampleOp::PerturbEnergy => x[i] - (-uniform(rng).ln()).ln(),
        SampleOp::PerturbProb => x[i] / -uniform(rng).ln(),
    })?;
    store(arena, target, &out)
}

pub(crate) fn dropout(
    arena: &ArenaAllocator,
    streams: &mut RngStreams,
    mat: &MatDesc,
    drop_prob: f32,
    value: f32,
    scale: f32,
) -> KernelResult {
    let x = load(arena, mat)?;
    let out = draw(streams, x.len(), |rng, i| {
        if uniform(rng) < drop_prob {
            value
        } else {
            x[i] * scale
        }
    })?;
    store(arena, mat, &out)
}
