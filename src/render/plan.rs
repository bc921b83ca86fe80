use crate::timeline::model::{Timeline, TimelineElement};

/// Position of an element inside a [`Timeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRef {
    /// Track index.
    pub track: usize,
    /// Element index within the track.
    pub element: usize,
}

impl DrawRef {
    /// Resolve against the timeline the plan was built from.
    pub fn resolve<'a>(&self, timeline: &'a Timeline) -> Option<&'a TimelineElement> {
        timeline
            .tracks
            .get(self.track)
            .and_then(|t| t.elements.get(self.element))
    }
}

/// Ordered draw list for one sample time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FramePlan {
    /// Video and image clips, bottom track first.
    pub media: Vec<DrawRef>,
    /// Text and decorative overlays, ascending `z_index`.
    pub overlays: Vec<DrawRef>,
}

impl FramePlan {
    /// Every draw in paint order.
    pub fn draws(&self) -> impl Iterator<Item = DrawRef> + '_ {
        self.media.iter().chain(self.overlays.iter()).copied()
    }

    /// Return `true` when nothing is active.
    pub fn is_empty(&self) -> bool {
        self.media.is_empty() && self.overlays.is_empty()
    }
}

/// Compute the draw order at timeline time `t`.
///
/// Media-backed elements draw in ascending track order. Overlays draw after all media, sorted by
/// ascending `z_index`, with ties kept in track order.
pub fn plan_frame(timeline: &Timeline, t: f64) -> FramePlan {
    let mut plan = FramePlan::default();
    let mut overlays = Vec::<(i32, DrawRef)>::new();

    for (track, tr) in timeline.tracks.iter().enumerate() {
        for (element, e) in tr.elements.iter().enumerate() {
            if !e.header().is_active_at(t) {
                continue;
            }
            let r = DrawRef { track, element };
            match e.overlay_transform() {
                Some(transform) => overlays.push((transform.z_index, r)),
                None => plan.media.push(r),
            }
        }
    }

    // Stable sort keeps (track, element) order among equal z.
    overlays.sort_by_key(|(z, _)| *z);
    plan.overlays = overlays.into_iter().map(|(_, r)| r).collect();
    plan
}

#[cfg(test)]
#[path = "../../tests/unit/render/plan.rs"]
mod tests;
