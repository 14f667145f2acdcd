use std::{fmt::Debug, rc::Rc, time::Duration};

pub type Retry = Box<dyn Iterator<Item = Duration>>;

/// Produces the delays to wait between attempts of a failed page load.
#[derive(Clone)]
pub struct Retryer(Rc<dyn Fn() -> Retry>);

impl Retryer {
    pub fn new<F, I>(f: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: Iterator<Item = Duration> + 'static,
    {
        let f = Rc::new(move || {
            let retry = f();
            Box::new(retry) as Retry
        });

        Retryer(f)
    }

    /// Retries `times` times waiting `delay` between each attempt.
    pub fn fixed(times: usize, delay: Duration) -> Self {
        Self::new(move || std::iter::repeat(delay).take(times))
    }

    /// Retries `times` times doubling the delay after each attempt.
    pub fn exponential(times: usize, initial: Duration) -> Self {
        Self::new(move || {
            std::iter::successors(Some(initial), |d| d.checked_mul(2)).take(times)
        })
    }

    pub fn get(&self) -> Retry {
        (self.0)()
    }
}

impl Debug for Retryer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Retryer")
    }
}
