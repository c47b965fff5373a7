pub mod configuration;

pub mod integrator {
    pub mod integrand;
    pub mod integrationerror;
    pub mod integrationmethod;
    pub mod integrator;
    pub mod convergence;
    pub mod integratormanager;
}

pub mod manager {
    pub mod namedobject;
    pub mod managererror;
    pub mod manager;
}

pub mod montecarlo {
    pub mod sampler;
    pub mod samplingdensity;
    pub mod flatmontecarlo;
    pub mod importancesampling;
    pub mod subinterval;
    pub mod adaptivemontecarlo;
}

pub mod newtoncotes {
    pub mod trapezoidrefinement;
    pub mod trapezoidal;
    pub mod simpson;
}

pub mod trial {
    pub mod trialstatistics;
    pub mod trialrunner;
}
