//! End-to-end tests: run the relgate binary against throwaway uv projects

mod helpers;
mod test_bump;
mod test_gates;
mod test_status;
