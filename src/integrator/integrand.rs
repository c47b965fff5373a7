use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// A real function of one variable.
///
/// `Send + Sync` is a supertrait so batches of samples can be evaluated
/// on worker threads.
pub trait Integrand: Send + Sync {
    fn value(&self, x: f64) -> f64;
}

impl<F> Integrand for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn value(&self, x: f64) -> f64 {
        self(x)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in integrands used by the command line
// ─────────────────────────────────────────────────────────────────────────────

fn gaussian(z: f64) -> f64 {
    (-z * z).exp() / PI.sqrt()
}

fn constant(_z: f64) -> f64 {
    1.0
}

fn sine(z: f64) -> f64 {
    z.sin()
}

/// Narrow bump at z = 0.55 on a flat background of height 0.1.
fn peak(z: f64) -> f64 {
    let x = (z - 0.55) / 0.02;
    0.1 + (-x * x).exp()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinIntegrand {
    /// exp(-z²)/√π, the squared ground-state wavefunction.
    Gaussian,
    Constant,
    Sine,
    Peak,
}

impl BuiltinIntegrand {
    pub fn function(&self) -> fn(f64) -> f64 {
        match self {
            BuiltinIntegrand::Gaussian => gaussian,
            BuiltinIntegrand::Constant => constant,
            BuiltinIntegrand::Sine => sine,
            BuiltinIntegrand::Peak => peak,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinIntegrand::Gaussian => "gaussian",
            BuiltinIntegrand::Constant => "constant",
            BuiltinIntegrand::Sine => "sine",
            BuiltinIntegrand::Peak => "peak",
        }
    }
}

impl fmt::Display for BuiltinIntegrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BuiltinIntegrand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(BuiltinIntegrand::Gaussian),
            "constant" => Ok(BuiltinIntegrand::Constant),
            "sine" => Ok(BuiltinIntegrand::Sine),
            "peak" => Ok(BuiltinIntegrand::Peak),
            _ => Err(format!("unknown integrand '{}'", s)),
        }
    }
}
