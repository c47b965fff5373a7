use crate::integrator::integrand::Integrand;
use crate::integrator::integrator::IntegrationDomain;

/// Extended trapezoidal sum refined by successive step halving.
///
/// Level 0 is the two-point rule `(b-a)(f(a)+f(b))/2`. Going from level k to
/// k+1 halves the step `h` and only evaluates the `2^k` new midpoints:
///
///   T_{k+1} = T_k / 2 + h · Σ f(a + (2i-1)h),  i = 1..=2^k
pub(crate) struct TrapezoidRefinement {
    lower: f64,
    step: f64,
    level: u32,
    value: f64,
}

impl TrapezoidRefinement {
    /// Evaluates the integrand at both endpoints.
    pub fn new(integrand: &dyn Integrand, domain: &IntegrationDomain) -> TrapezoidRefinement {
        let width = domain.width();
        let value = width * (integrand.value(domain.upper()) + integrand.value(domain.lower())) / 2.0;
        TrapezoidRefinement {
            lower: domain.lower(),
            step: width,
            level: 0,
            value,
        }
    }

    pub const INITIAL_EVALUATIONS: usize = 2;

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Number of new points the next call to `refine` evaluates.
    pub fn next_evaluations(&self) -> usize {
        1usize << self.level
    }

    /// Moves to the next level and returns the number of integrand evaluations spent.
    pub fn refine(&mut self, integrand: &dyn Integrand) -> usize {
        let new_points = self.next_evaluations();
        self.step /= 2.0;
        let sum: f64 = (1..=new_points)
            .map(|i| integrand.value(self.lower + (2 * i - 1) as f64 * self.step))
            .sum();
        self.value = self.value / 2.0 + self.step * sum;
        self.level += 1;
        new_points
    }
}
