use crate::admin::filter::filter_records;
use crate::models::Entity;

/// Selection and search state for one tab's record list. The records
/// themselves live in the admin state's collections; this only remembers
/// which of the currently visible ones is highlighted.
#[derive(Default)]
pub(crate) struct ListScreen {
    pub(crate) filter: String,
    pub(crate) selected: usize,
}

impl ListScreen {
    /// Records matching the current filter, in list order.
    pub(crate) fn visible<'a, E: Entity>(&self, items: &'a [E]) -> Vec<&'a E> {
        filter_records(items, &self.filter)
    }

    pub(crate) fn current<'a, E: Entity>(&self, items: &'a [E]) -> Option<&'a E> {
        self.visible(items).get(self.selected).copied()
    }

    pub(crate) fn set_filter<E: Entity>(&mut self, filter: &str, items: &[E]) {
        self.filter = filter.to_string();
        let visible_len = self.visible(items).len();
        self.clamp(visible_len);
    }

    pub(crate) fn move_selection(&mut self, offset: isize, visible_len: usize) {
        if visible_len == 0 {
            self.selected = 0;
            return;
        }
        let last = visible_len as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, visible_len: usize) {
        self.selected = visible_len.saturating_sub(1);
    }

    /// Keep the selection inside the list after it shrinks.
    pub(crate) fn clamp(&mut self, visible_len: usize) {
        if visible_len == 0 {
            self.selected = 0;
        } else if self.selected >= visible_len {
            self.selected = visible_len - 1;
        }
    }
}

/// State for an active inline search.
pub(crate) struct SearchState {
    pub(crate) query: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bird;

    fn birds(names: &[&str]) -> Vec<Bird> {
        names
            .iter()
            .map(|name| Bird {
                english_name: name.to_string(),
                ..Bird::default()
            })
            .collect()
    }

    #[test]
    fn selection_stays_within_visible_records() {
        let items = birds(&["Bald Eagle", "Scarlet Macaw", "Golden Eagle"]);
        let mut screen = ListScreen::default();
        screen.move_selection(5, items.len());
        assert_eq!(screen.selected, 2);

        screen.set_filter("eagle", &items);
        assert_eq!(screen.visible(&items).len(), 2);
        assert_eq!(screen.selected, 1);
        assert_eq!(
            screen.current(&items).map(|b| b.english_name.as_str()),
            Some("Golden Eagle")
        );

        screen.move_selection(-10, 2);
        assert_eq!(screen.selected, 0);
    }
}
