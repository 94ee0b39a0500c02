/// Visibility state for the source panel sidebar.
///
/// A single flag drives both affordances: the inline hide control on the
/// panel itself and the floating reveal badge in the status line. Both are
/// derived from the flag, so exactly one is visible at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SidebarState {
    collapsed: bool,
}

impl SidebarState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn toggle(&mut self) {
        self.collapsed = !self.collapsed;
    }

    /// Reveal the panel when hidden. No-op when already visible.
    pub fn reveal_if_collapsed(&mut self) {
        if self.collapsed {
            self.collapsed = false;
        }
    }

    /// The panel's own hide control, shown while the panel is visible.
    pub fn collapse_control_visible(&self) -> bool {
        !self.collapsed
    }

    /// The status-line reveal badge, shown while the panel is hidden.
    pub fn reveal_control_visible(&self) -> bool {
        self.collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_revealed() {
        let sidebar = SidebarState::new();
        assert!(!sidebar.is_collapsed());
        assert!(sidebar.collapse_control_visible());
        assert!(!sidebar.reveal_control_visible());
    }

    #[test]
    fn test_toggle_flips_state() {
        let mut sidebar = SidebarState::new();
        sidebar.toggle();
        assert!(sidebar.is_collapsed());
        sidebar.toggle();
        assert!(!sidebar.is_collapsed());
    }

    #[test]
    fn test_reveal_if_collapsed_only_acts_when_hidden() {
        let mut sidebar = SidebarState::new();
        sidebar.reveal_if_collapsed();
        assert!(!sidebar.is_collapsed());

        sidebar.toggle();
        assert!(sidebar.is_collapsed());
        sidebar.reveal_if_collapsed();
        assert!(!sidebar.is_collapsed());
    }

    #[test]
    fn test_exactly_one_affordance_visible() {
        let mut sidebar = SidebarState::new();
        for _ in 0..5 {
            assert_ne!(
                sidebar.collapse_control_visible(),
                sidebar.reveal_control_visible()
            );
            sidebar.toggle();
            assert_ne!(
                sidebar.collapse_control_visible(),
                sidebar.reveal_control_visible()
            );
            sidebar.reveal_if_collapsed();
        }
    }
}
