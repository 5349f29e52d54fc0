use crate::{Point2i, Point2f, Float};
use rand_xoshiro::Xoshiro256Plus;
use rand::{SeedableRng, Rng};
use crate::sampler::Sampler;

/// A sampler that draws every dimension from an independent uniform random
/// stream. No stratification, no low-discrepancy structure - the simplest
/// possible baseline, useful for comparison against the Halton sampler used
/// by the production integrators.
pub struct RandomSampler {
    samples_per_pixel: u64,
    rng: Xoshiro256Plus,
    current_pixel_sample_num: u64,

    array_1d_sizes: Vec<usize>,
    array_2d_sizes: Vec<usize>,
    array_1d_values: Vec<Vec<Float>>,
    array_2d_values: Vec<Vec<Point2f>>,
    array_1d_offset: usize,
    array_2d_offset: usize,
}

impl RandomSampler {
    pub fn new_with_seed(samples_per_pixel: u64, seed: u64) -> Self {
        Self {
            samples_per_pixel,
            rng: Xoshiro256Plus::seed_from_u64(seed),
            current_pixel_sample_num: 0,
            array_1d_sizes: vec![],
            array_2d_sizes: vec![],
            array_1d_values: vec![],
            array_2d_values: vec![],
            array_1d_offset: 0,
            array_2d_offset: 0,
        }
    }

    fn refill_arrays(&mut self) {
        for (i, &len) in self.array_1d_sizes.iter().enumerate() {
            let n = len * self.samples_per_pixel as usize;
            self.array_1d_values[i] = (0..n).map(|_| self.rng.gen()).collect();
        }
        for (i, &len) in self.array_2d_sizes.iter().enumerate() {
            let n = len * self.samples_per_pixel as usize;
            self.array_2d_values[i] = (0..n)
                .map(|_| Point2f::new(self.rng.gen(), self.rng.gen()))
                .collect();
        }
    }

    fn sample_index(&self) -> usize {
        self.current_pixel_sample_num.saturating_sub(1) as usize
    }
}

impl Sampler for RandomSampler {
    fn start_pixel(&mut self, _pixel: Point2i) {
        self.current_pixel_sample_num = 0;
        self.array_1d_offset = 0;
        self.array_2d_offset = 0;
        self.refill_arrays();
    }

    fn start_next_sample(&mut self) -> bool {
        self.array_1d_offset = 0;
        self.array_2d_offset = 0;
        self.current_pixel_sample_num += 1;
        self.current_pixel_sample_num <= self.samples_per_pixel
    }

    fn get_1d(&mut self) -> Float {
        self.rng.gen()
    }

    fn get_2d(&mut self) -> Point2f {
        Point2f::new(self.rng.gen(), self.rng.gen())
    }

    fn request_1d_array(&mut self, len: usize) {
        self.array_1d_sizes.push(len);
        self.array_1d_values.push(Vec::new());
    }

    fn request_2d_array(&mut self, len: usize) {
        self.array_2d_sizes.push(len);
        self.array_2d_values.push(Vec::new());
    }

    fn get_1d_array(&mut self, len: usize) -> &[Float] {
        let idx = self.array_1d_offset;
        self.array_1d_offset += 1;
        let start = self.sample_index() * len;
        &self.array_1d_values[idx][start..start + len]
    }

    fn get_2d_array(&mut self, len: usize) -> &[Point2f] {
        let idx = self.array_2d_offset;
        self.array_2d_offset += 1;
        let start = self.sample_index() * len;
        &self.array_2d_values[idx][start..start + len]
    }

    fn clone_with_seed(&self, seed: u64) -> Box<dyn Sampler> {
        Box::new(Self::new_with_seed(self.samples_per_pixel, seed))
    }

    fn samples_per_pixel(&self) -> usize {
        self.samples_per_pixel as usize
    }

    fn set_sample_number(&mut self, sample_num: u64) -> bool {
        self.array_1d_offset = 0;
        self.array_2d_offset = 0;
        self.current_pixel_sample_num = sample_num;
        sample_num < self.samples_per_pixel
    }
}
