pub mod health;
pub mod mahasiswa;
