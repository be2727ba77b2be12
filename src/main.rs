/// Binary entrypoint for the `refbuild` executable.
///
/// Keeps the binary thin; all business logic lives in the `refbuild_lib`
/// crate so tests can import library functions directly.
fn main() {
    refbuild_lib::run();
}
