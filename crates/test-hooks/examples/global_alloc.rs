// Stdout tracing from inside the global allocator would re-enter stdout's
// lock, so this demo only prints the final report.
#[linkhook::main(trace = "off")]
fn main() {
    let scratch: Vec<u64> = (0..64).collect();
    let sum: u64 = scratch.iter().sum();
    drop(scratch);

    let leaked: &'static mut [u8] = Box::leak(vec![7u8; 1024].into_boxed_slice());
    leaked[0] = (sum % 251) as u8;
}
