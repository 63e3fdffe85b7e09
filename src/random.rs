//! Random generator state and stochastic matrix operations
//!
//! [`RandomState`] is an explicit context object: create one per process (or per
//! device) with a seed and pass it to every stochastic operation. The same seed
//! reproduces the same sequence of draws.
//!
//! ```ignore
//! let rng = RandomState::new(&client, 42)?;
//! let m = Matrix::<CpuRuntime>::empty(&client, 128, 64)?;
//! m.fill_uniform(&rng)?;
//! m.sample_bernoulli(&rng, None)?;
//! ```

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::runtime::{KernelLibrary, RngStreams, Runtime, SampleOp, Status};
use parking_lot::Mutex;

/// Default number of parallel generator streams
pub const NUM_RND_STREAMS: usize = 96 * 128;

/// Seeded generator state shared by stochastic operations
///
/// Every call advances the state, so concurrent callers are serialized by an
/// internal lock.
#[derive(Debug)]
pub struct RandomState<R: Runtime> {
    client: R::Client,
    streams: Mutex<RngStreams>,
}

impl<R: Runtime> RandomState<R> {
    /// Initialize [`NUM_RND_STREAMS`] streams from `seed`
    pub fn new(client: &R::Client, seed: u64) -> Result<Self> {
        Self::with_streams(client, seed, NUM_RND_STREAMS)
    }

    /// Initialize `streams` parallel streams from `seed`
    pub fn with_streams(client: &R::Client, seed: u64, streams: usize) -> Result<Self> {
        if streams == 0 {
            return Err(Error::precondition(
                "RandomState::with_streams",
                "at least one stream is required",
            ));
        }
        let state = Self {
            client: client.clone(),
            streams: Mutex::new(RngStreams::new(streams)),
        };
        state.reseed(seed)?;
        Ok(state)
    }

    /// Discard the current state and reinitialize every stream from `seed`
    pub fn reseed(&self, seed: u64) -> Result<()> {
        let mut streams = self.streams.lock();
        let status = self.client.init_random(&mut streams, seed);
        status.check(|| self.client.last_error())?;
        log::info!("initialized {} random streams with seed {seed}", streams.len());
        Ok(())
    }

    /// Number of parallel streams
    pub fn num_streams(&self) -> usize {
        self.streams.lock().len()
    }

    fn with_streams_locked(&self, f: impl FnOnce(&mut RngStreams) -> Status) -> Status {
        f(&mut self.streams.lock())
    }
}

impl<R: Runtime> Matrix<R> {
    fn sample_op<'a>(
        &'a self,
        rng: &RandomState<R>,
        op: SampleOp,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        let target = target.unwrap_or(self);
        let (src, dst) = (self.desc(), target.desc());
        let status = rng.with_streams_locked(|s| self.client().sample(s, op, &src, &dst));
        self.check(status)?;
        Ok(target)
    }

    /// Fill with uniform samples from (0, 1)
    pub fn fill_uniform(&self, rng: &RandomState<R>) -> Result<&Self> {
        let desc = self.desc();
        let status = rng.with_streams_locked(|s| self.client().fill_with_rand(s, &desc));
        self.check(status)?;
        Ok(self)
    }

    /// Fill with standard normal samples
    pub fn fill_normal(&self, rng: &RandomState<R>) -> Result<&Self> {
        let desc = self.desc();
        let status = rng.with_streams_locked(|s| self.client().fill_with_randn(s, &desc));
        self.check(status)?;
        Ok(self)
    }

    /// 1 with probability given by each entry, 0 otherwise
    pub fn sample_bernoulli<'a>(
        &'a self,
        rng: &RandomState<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.sample_op(rng, SampleOp::Bernoulli, target)
    }

    /// 1 with probability (1 + x) / 2, -1 otherwise
    pub fn sample_bernoulli_symmetric<'a>(
        &'a self,
        rng: &RandomState<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.sample_op(rng, SampleOp::BernoulliSymmetric, target)
    }

    /// Poisson sample with each entry as the rate
    pub fn sample_poisson<'a>(
        &'a self,
        rng: &RandomState<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.sample_op(rng, SampleOp::Poisson, target)
    }

    /// Add gaussian noise with standard deviation `mult`
    pub fn sample_gaussian_noise<'a>(
        &'a self,
        rng: &RandomState<R>,
        mult: f32,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.sample_op(rng, SampleOp::GaussianNoise { mult }, target)
    }

    /// Gumbel-perturb energies so an argmax samples from their softmax
    pub fn perturb_for_softmax_sampling_additive<'a>(
        &'a self,
        rng: &RandomState<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.sample_op(rng, SampleOp::PerturbEnergy, target)
    }

    /// Perturb probabilities so an argmax samples from them
    pub fn perturb_for_softmax_sampling_multiplicative<'a>(
        &'a self,
        rng: &RandomState<R>,
        target: Option<&'a Matrix<R>>,
    ) -> Result<&'a Matrix<R>> {
        self.sample_op(rng, SampleOp::PerturbProb, target)
    }

    /// Replace each entry by `value` with probability `drop_prob`, scale the rest
    pub fn dropout(
        &self,
        rng: &RandomState<R>,
        drop_prob: f32,
        value: f32,
        scale: f32,
    ) -> Result<&Self> {
        let desc = self.desc();
        let status = rng.with_streams_locked(|s| {
            self.client().dropout(s, &desc, drop_prob, value, scale)
        });
        self.check(status)?;
        Ok(self)
    }
}
