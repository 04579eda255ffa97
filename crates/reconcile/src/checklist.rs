use std::collections::HashSet;

use crate::types::{ChecklistItem, TemplateChecklistItem};

/// Mark each template checklist entry done when its question id appears in
/// the submitted id set.
///
/// Output order follows the template's `order` field. The list is rebuilt
/// wholesale on every call; nothing is patched in place.
pub fn reconcile_checklist(
    template: &[TemplateChecklistItem],
    submitted_ids: &HashSet<String>,
) -> Vec<ChecklistItem> {
    let mut entries: Vec<&TemplateChecklistItem> = template.iter().collect();
    entries.sort_by_key(|e| e.order);

    entries
        .into_iter()
        .map(|e| ChecklistItem {
            id: e.question_id.clone(),
            text: e.text.clone(),
            done: submitted_ids.contains(&e.question_id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, text: &str, order: i64) -> TemplateChecklistItem {
        TemplateChecklistItem {
            question_id: id.to_string(),
            text: text.to_string(),
            order,
        }
    }

    fn ids(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn done_is_exactly_the_intersection() {
        let template = vec![entry("q1", "Verify identity", 1), entry("q2", "Confirm income", 2)];
        let items = reconcile_checklist(&template, &ids(&["q2", "q9"]));

        assert_eq!(items.len(), 2);
        assert!(!items[0].done);
        assert!(items[1].done);
    }

    #[test]
    fn order_field_drives_display_order() {
        let template = vec![entry("b", "Second", 2), entry("a", "First", 1)];
        let items = reconcile_checklist(&template, &HashSet::new());
        assert_eq!(items[0].id, "a");
        assert_eq!(items[1].id, "b");
    }

    #[test]
    fn toggling_one_id_flips_exactly_one_item() {
        let template = vec![entry("q1", "A", 1), entry("q2", "B", 2), entry("q3", "C", 3)];

        let before = reconcile_checklist(&template, &ids(&["q1"]));
        let after = reconcile_checklist(&template, &ids(&["q1", "q3"]));

        let flipped: Vec<_> = before
            .iter()
            .zip(&after)
            .filter(|(b, a)| b.done != a.done)
            .collect();
        assert_eq!(flipped.len(), 1);
        assert_eq!(flipped[0].1.id, "q3");
        assert!(flipped[0].1.done);
    }

    #[test]
    fn empty_template_yields_empty_list() {
        assert!(reconcile_checklist(&[], &ids(&["q1"])).is_empty());
    }
}
