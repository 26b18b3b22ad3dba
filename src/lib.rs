pub mod constants;
pub mod diffraction_correction;
pub mod diffrec_errors;
pub mod fresnel_kernel;
pub mod fresnel_transform;
pub mod observation;
pub mod params;
pub mod range_selector;
pub mod region;
pub mod result_finalizer;
pub mod special_functions;
pub mod validation;
pub mod window_functions;
pub mod window_width;
