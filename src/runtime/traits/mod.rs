//! Backend seam: device identity, memory-owning client, and the runtime tying them
//!
//! A backend implements all three plus [`KernelLibrary`](crate::runtime::KernelLibrary)
//! on its client. Matrices are generic over the [`Runtime`].

mod client;
mod device;
mod runtime;

pub use client::RuntimeClient;
pub use device::Device;
pub use runtime::Runtime;
