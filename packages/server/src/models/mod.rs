pub mod mahasiswa;
pub mod shared;
