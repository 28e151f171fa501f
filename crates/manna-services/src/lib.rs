//! Entity services and context providers for Manna.
//!
//! Every service is generic over a [`RemoteStore`] and shares one failure
//! discipline: reads that fail are answered from the bundled datasets in
//! [`seed`] and come back as [`Fetched::Fallback`]; writes that fail return
//! [`Error::Remote`] carrying the backend's own error.
//!
//! [`Fetched::Fallback`]: manna_core::Fetched::Fallback

use std::sync::Arc;

use manna_core::{Error, fallback::write_failed, store::RemoteStore};

/// Declares a service struct holding an `Arc<S>`, with `new` and a `Clone`
/// impl that does not require `S: Clone`.
macro_rules! service {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    pub struct $name<S> {
      store: std::sync::Arc<S>,
    }

    impl<S> $name<S> {
      pub fn new(store: std::sync::Arc<S>) -> Self { Self { store } }
    }

    impl<S> Clone for $name<S> {
      fn clone(&self) -> Self {
        Self {
          store: self.store.clone(),
        }
      }
    }
  };
}
pub(crate) use service;

pub mod channels;
pub mod context;
mod counter;
pub mod devotionals;
pub mod events;
pub mod friends;
pub mod notifications;
pub mod plans;
pub mod points;
pub mod referrals;
pub mod rows;
pub mod seed;
pub mod verses;

#[cfg(test)]
mod testing;

pub use channels::ChannelService;
pub use devotionals::DevotionalService;
pub use events::EventService;
pub use friends::FriendService;
pub use notifications::NotificationService;
pub use plans::PlanService;
pub use points::PointsService;
pub use referrals::ReferralService;

/// Map a backend error on a write path: wrap, log, return.
pub(crate) fn failed_write<E>(entity: &'static str) -> impl FnOnce(E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  move |e| write_failed(entity, Error::remote(e))
}

/// Every entity service over one shared store handle.
pub struct Services<S> {
  pub devotionals:   DevotionalService<S>,
  pub plans:         PlanService<S>,
  pub events:        EventService<S>,
  pub friends:       FriendService<S>,
  pub notifications: NotificationService<S>,
  pub channels:      ChannelService<S>,
  pub referrals:     ReferralService<S>,
  pub points:        PointsService<S>,
  store:             Arc<S>,
}

impl<S: RemoteStore> Services<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      devotionals:   DevotionalService::new(store.clone()),
      plans:         PlanService::new(store.clone()),
      events:        EventService::new(store.clone()),
      friends:       FriendService::new(store.clone()),
      notifications: NotificationService::new(store.clone()),
      channels:      ChannelService::new(store.clone()),
      referrals:     ReferralService::new(store.clone()),
      points:        PointsService::new(store.clone()),
      store,
    }
  }

  /// The underlying store handle.
  pub fn store(&self) -> &Arc<S> { &self.store }
}

impl<S> Clone for Services<S> {
  fn clone(&self) -> Self {
    Self {
      devotionals:   self.devotionals.clone(),
      plans:         self.plans.clone(),
      events:        self.events.clone(),
      friends:       self.friends.clone(),
      notifications: self.notifications.clone(),
      channels:      self.channels.clone(),
      referrals:     self.referrals.clone(),
      points:        self.points.clone(),
      store:         self.store.clone(),
    }
  }
}
