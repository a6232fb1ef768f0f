// Bookkeeping for cover loads waiting on the pipeline
// A target waits with the token it was stamped with at load time. When the
// result arrives, only targets still carrying that token are updated; anything
// rebound or cleared in the meantime is skipped.

use std::collections::HashMap;

/// Something a cover can be shown on.
pub trait CoverTarget {
    type Cover: ?Sized;

    /// Token of the most recent load, 0 once detached or gone.
    fn load_token(&self) -> u64;

    fn show_cover(&self, cover: &Self::Cover);
}

struct Waiter<W> {
    target: W,
    token: u64,
}

pub struct CoverWaiters<W> {
    waiters: HashMap<String, Vec<Waiter<W>>>,
}

impl<W: CoverTarget> CoverWaiters<W> {
    pub fn new() -> Self {
        Self {
            waiters: HashMap::new(),
        }
    }

    pub fn wait(&mut self, url: &str, target: W, token: u64) {
        self.waiters
            .entry(url.to_string())
            .or_default()
            .push(Waiter { target, token });
    }

    /// Drop the most recent waiter for `url`, leaving earlier ones queued.
    pub fn withdraw_last(&mut self, url: &str) {
        if let Some(list) = self.waiters.get_mut(url) {
            list.pop();
            if list.is_empty() {
                self.waiters.remove(url);
            }
        }
    }

    pub fn waiting(&self, url: &str) -> usize {
        self.waiters.get(url).map_or(0, Vec::len)
    }

    /// Resolve every waiter for `url`. Returns how many targets were updated.
    /// A failed load (`None`) updates nothing, so targets keep their placeholder.
    pub fn settle(&mut self, url: &str, cover: Option<&W::Cover>) -> usize {
        let waiters = self.waiters.remove(url).unwrap_or_default();
        let Some(cover) = cover else {
            return 0;
        };

        let mut shown = 0;
        for waiter in waiters {
            if waiter.token != 0 && waiter.target.load_token() == waiter.token {
                waiter.target.show_cover(cover);
                shown += 1;
            }
        }
        shown
    }
}

impl<W: CoverTarget> Default for CoverWaiters<W> {
    fn default() -> Self {
        Self::new()
    }
}
