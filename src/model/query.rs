//! Filtering and ordering of catalog tracks.

use crate::model::{Container, TrackDescriptor, TrackKind};
use std::cmp::Ordering;

/// The attribute tracks are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityKey {
    /// Frame height, tracks without one sort lowest.
    Height,
    /// Bitrate in bits per second.
    Bitrate,
}

impl QualityKey {
    fn compare(&self, a: &TrackDescriptor, b: &TrackDescriptor) -> Ordering {
        match self {
            QualityKey::Height => a.height.unwrap_or(0).cmp(&b.height.unwrap_or(0)),
            QualityKey::Bitrate => a.bitrate.cmp(&b.bitrate),
        }
    }
}

/// A query over a list of tracks.
///
/// Filters narrow the selection, `order_by` sorts it ascending unless `desc` is set.
/// Sorting is stable, so tracks of equal quality keep their catalog order.
///
/// # Example
///
/// ```rust
/// # use ytmux::model::{Container, QualityKey, TrackDescriptor, TrackKind, TrackQuery};
/// let tracks: Vec<TrackDescriptor> = Vec::new();
/// let best = TrackQuery::new(&tracks)
///     .kind(TrackKind::AudioOnly)
///     .container(Container::Mp4)
///     .order_by(QualityKey::Bitrate)
///     .desc()
///     .first();
/// assert!(best.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct TrackQuery<'a> {
    tracks: Vec<&'a TrackDescriptor>,
    order: Option<QualityKey>,
    descending: bool,
}

impl<'a> TrackQuery<'a> {
    /// Starts a query selecting every track.
    pub fn new(tracks: &'a [TrackDescriptor]) -> Self {
        Self {
            tracks: tracks.iter().collect(),
            order: None,
            descending: false,
        }
    }

    /// Keeps tracks of the given kind.
    pub fn kind(mut self, kind: TrackKind) -> Self {
        self.tracks.retain(|t| t.kind == kind);
        self
    }

    /// Keeps tracks in the given container.
    pub fn container(mut self, container: Container) -> Self {
        self.tracks.retain(|t| t.container == container);
        self
    }

    /// Keeps tracks whose height is known and at most `max`.
    pub fn max_height(mut self, max: u32) -> Self {
        self.tracks.retain(|t| t.height.is_some_and(|h| h <= max));
        self
    }

    /// Orders the selection by the given attribute.
    pub fn order_by(mut self, key: QualityKey) -> Self {
        self.order = Some(key);
        self
    }

    /// Reverses the ordering.
    pub fn desc(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Returns every selected track, in order.
    pub fn all(self) -> Vec<&'a TrackDescriptor> {
        let mut tracks = self.tracks;
        if let Some(key) = self.order {
            if self.descending {
                tracks.sort_by(|a, b| key.compare(b, a));
            } else {
                tracks.sort_by(|a, b| key.compare(a, b));
            }
        }

        tracks
    }

    /// Returns the first selected track, in order.
    pub fn first(self) -> Option<&'a TrackDescriptor> {
        self.all().into_iter().next()
    }
}
