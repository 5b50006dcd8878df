//! Subscription helpers bridging channels and timers to iced
//!
//! - [`mpsc_subscription`]: yields items from a `std::sync::mpsc` receiver
//!   (envelope results from the background computer)
//! - [`poll_ticks`]: repeating timer tagged with a [`TimerToken`], driving
//!   playback position polling
//!
//! ```ignore
//! fn subscription(&self) -> Subscription<Message> {
//!     let mut subs = vec![
//!         mpsc_subscription(self.computer.result_receiver()).map(Message::EnvelopeReady),
//!     ];
//!     if let Some(token) = self.session.timer_token() {
//!         subs.push(poll_ticks(token, self.session.poll_interval()).map(Message::PollTick));
//!     }
//!     Subscription::batch(subs)
//! }
//! ```

use std::any::TypeId;
use std::hash::Hash;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iced::advanced::subscription::{self, EventStream, Hasher, Recipe};
use iced::futures::stream::BoxStream;
use iced::Subscription;
use wavesync_core::playback::TimerToken;

/// Recipe for polling an mpsc receiver as an iced subscription
struct MpscRecipe<T> {
    /// Identity of the receiver (its Arc address)
    id: u64,
    receiver: Arc<Mutex<Receiver<T>>>,
}

impl<T: Send + 'static> Recipe for MpscRecipe<T> {
    type Output = T;

    fn hash(&self, state: &mut Hasher) {
        TypeId::of::<Self>().hash(state);
        self.id.hash(state);
    }

    fn stream(self: Box<Self>, _input: EventStream) -> BoxStream<'static, Self::Output> {
        let receiver = self.receiver;

        Box::pin(iced::futures::stream::unfold(receiver, |rx| async move {
            loop {
                if let Some(item) = rx.lock().ok().and_then(|r| r.try_recv().ok()) {
                    return Some((item, rx));
                }

                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }))
    }
}

/// Create an iced subscription from a shared mpsc receiver
///
/// Polls the receiver with a 1 ms sleep between empty reads. Use `.map()`
/// to convert to your message type.
pub fn mpsc_subscription<T>(receiver: Arc<Mutex<Receiver<T>>>) -> Subscription<T>
where
    T: Send + 'static,
{
    let id = Arc::as_ptr(&receiver) as u64;

    subscription::from_recipe(MpscRecipe { id, receiver })
}

/// Recipe for a repeating timer identified by a [`TimerToken`]
struct PollRecipe {
    token: TimerToken,
    interval: Duration,
}

impl Recipe for PollRecipe {
    type Output = TimerToken;

    fn hash(&self, state: &mut Hasher) {
        TypeId::of::<Self>().hash(state);
        self.token.hash(state);
        self.interval.hash(state);
    }

    fn stream(self: Box<Self>, _input: EventStream) -> BoxStream<'static, Self::Output> {
        let token = self.token;
        let interval = self.interval;

        Box::pin(iced::futures::stream::unfold((), move |()| async move {
            tokio::time::sleep(interval).await;
            Some((token, ()))
        }))
    }
}

/// Emit `token` every `interval` for as long as the subscription is requested
///
/// Each token is a distinct subscription: when the caller stops returning it
/// (pause, completion, reload), iced drops the stream. A tick that was already
/// queued still carries the old token and is recognised as stale.
pub fn poll_ticks(token: TimerToken, interval: Duration) -> Subscription<TimerToken> {
    subscription::from_recipe(PollRecipe { token, interval })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavesync_core::playback::PollTimer;

    #[test]
    fn test_mpsc_recipes_differ_per_receiver() {
        let digest = |receiver: &Arc<Mutex<Receiver<u8>>>| {
            let mut hasher = Hasher::default();
            MpscRecipe {
                id: Arc::as_ptr(receiver) as u64,
                receiver: Arc::clone(receiver),
            }
            .hash(&mut hasher);
            std::hash::Hasher::finish(&hasher)
        };

        let (_tx_a, rx_a) = std::sync::mpsc::channel();
        let (_tx_b, rx_b) = std::sync::mpsc::channel();
        let a = Arc::new(Mutex::new(rx_a));
        let b = Arc::new(Mutex::new(rx_b));

        assert_ne!(digest(&a), digest(&b));
        assert_eq!(digest(&a), digest(&a));
    }

    #[test]
    fn test_poll_recipes_differ_per_token() {
        let mut timer = PollTimer::default();
        let first = timer.start();
        let second = timer.start();

        let digest = |token| {
            let mut hasher = Hasher::default();
            PollRecipe {
                token,
                interval: Duration::from_millis(50),
            }
            .hash(&mut hasher);
            std::hash::Hasher::finish(&hasher)
        };

        assert_ne!(digest(first), digest(second));
        assert_eq!(digest(first), digest(first));
    }
}
