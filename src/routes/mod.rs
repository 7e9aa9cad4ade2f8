mod pages;

pub use pages::{generate, index, CertificateForm};
