pub mod taste;
