//! Pointer-drag state machine for the crop region.
//!
//! `Idle -> Dragging -> Idle`. Entering `Dragging` attaches the move/up
//! listeners; leaving it (pointer up or cancel) detaches them. Move events
//! that arrive while `Idle` belong to no gesture and are ignored.

use super::geometry::{CropRegion, Point};

/// Current gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// A drag is in progress; `grab` is the pointer position relative to
    /// the region's top-left corner at pointer-down.
    Dragging { grab: Point },
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragTransition {
    /// The event did not concern the region.
    Ignored,
    /// A drag started; move/up listeners are now attached.
    Attached,
    /// The region moved to this display-space origin; redraw needed.
    Moved(Point),
    /// The pointer moved but the clamped region did not; no redraw.
    Unchanged,
    /// The drag ended; listeners are detached.
    Detached,
}

/// Drives a [`CropRegion`] from pointer events.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
    tolerance: f64,
}

impl DragController {
    /// Creates a controller that grabs within `tolerance` display units of
    /// the region's edges.
    pub fn new(tolerance: f64) -> Self {
        Self {
            state: DragState::Idle,
            tolerance: tolerance.max(0.0),
        }
    }

    /// Current state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Whether move/up listeners are attached.
    pub fn is_listening(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn pointer_down(&mut self, region: &CropRegion, pointer: Point) -> DragTransition {
        if self.is_listening() || !region.contains(pointer, self.tolerance) {
            return DragTransition::Ignored;
        }
        let origin = region.origin();
        self.state = DragState::Dragging {
            grab: Point::new(pointer.x - origin.x, pointer.y - origin.y),
        };
        tracing::trace!(x = pointer.x, y = pointer.y, "Crop drag started");
        DragTransition::Attached
    }

    pub fn pointer_move(&mut self, region: &mut CropRegion, pointer: Point) -> DragTransition {
        let DragState::Dragging { grab } = self.state else {
            return DragTransition::Ignored;
        };
        if region.move_to(Point::new(pointer.x - grab.x, pointer.y - grab.y)) {
            DragTransition::Moved(region.origin())
        } else {
            DragTransition::Unchanged
        }
    }

    pub fn pointer_up(&mut self) -> DragTransition {
        self.detach()
    }

    /// Ends any gesture in progress, detaching its listeners.
    pub fn cancel(&mut self) -> DragTransition {
        self.detach()
    }

    fn detach(&mut self) -> DragTransition {
        match std::mem::take(&mut self.state) {
            DragState::Idle => DragTransition::Ignored,
            DragState::Dragging { .. } => {
                tracing::trace!("Crop drag ended");
                DragTransition::Detached
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::geometry::{Layout, Size};

    fn region() -> CropRegion {
        let layout = Layout::fit(640, 480, Size::new(640.0, 480.0)).unwrap();
        CropRegion::new(layout, Size::new(100.0, 100.0)).unwrap()
    }

    #[test]
    fn test_drag_moves_by_delta() {
        let mut region = region();
        let mut drag = DragController::new(10.0);

        assert_eq!(
            drag.pointer_down(&region, Point::new(20.0, 30.0)),
            DragTransition::Attached
        );
        assert_eq!(
            drag.pointer_move(&mut region, Point::new(70.0, 90.0)),
            DragTransition::Moved(Point::new(50.0, 60.0))
        );
        assert_eq!(drag.pointer_up(), DragTransition::Detached);
        assert!(!drag.is_listening());
    }

    #[test]
    fn test_press_outside_region_is_ignored() {
        let mut region = region();
        let mut drag = DragController::new(10.0);

        assert_eq!(
            drag.pointer_down(&region, Point::new(300.0, 300.0)),
            DragTransition::Ignored
        );
        assert_eq!(
            drag.pointer_move(&mut region, Point::new(310.0, 310.0)),
            DragTransition::Ignored
        );
        assert_eq!(region.origin(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_clamped_move_reports_unchanged() {
        let mut region = region();
        let mut drag = DragController::new(0.0);

        drag.pointer_down(&region, Point::new(10.0, 10.0));
        // Pushing further into the top-left corner cannot move the region.
        assert_eq!(
            drag.pointer_move(&mut region, Point::new(5.0, 5.0)),
            DragTransition::Unchanged
        );
    }

    #[test]
    fn test_cancel_detaches_mid_drag() {
        let mut region = region();
        let mut drag = DragController::new(10.0);

        drag.pointer_down(&region, Point::new(50.0, 50.0));
        assert!(drag.is_listening());
        assert_eq!(drag.cancel(), DragTransition::Detached);
        assert_eq!(
            drag.pointer_move(&mut region, Point::new(200.0, 200.0)),
            DragTransition::Ignored
        );
        assert_eq!(drag.cancel(), DragTransition::Ignored);
    }
}
