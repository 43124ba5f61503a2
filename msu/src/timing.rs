//! Timing utilities.

#[cfg(feature = "timings")]
use std::time::Instant;

#[cfg(feature = "timings")]
#[inline]
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    println!("{name} ...");
    let t = Instant::now();
    let r = f();
    println!("... {:?}", t.elapsed());
    r
}

#[cfg(not(feature = "timings"))]
#[inline]
pub fn timed<R>(_: &str, f: impl FnOnce() -> R) -> R {
    f()
}
