pub mod mahasiswa;
