use crate::scanner::records::FileRecord;

/// Choose the copy that stays: the lexicographically smallest path.
/// Deterministic across runs and independent of traversal order.
pub fn retained_member(records: &[FileRecord], members: &[usize]) -> Option<usize> {
    members
        .iter()
        .copied()
        .min_by(|&a, &b| records[a].path.cmp(&records[b].path))
}

/// Retained member first, then the rest by path
pub fn order_members(records: &[FileRecord], members: &[usize], retained: usize) -> Vec<usize> {
    let mut rest: Vec<usize> = members.iter().copied().filter(|&i| i != retained).collect();
    rest.sort_by(|&a, &b| records[a].path.cmp(&records[b].path));
    let mut ordered = Vec::with_capacity(members.len());
    ordered.push(retained);
    ordered.extend(rest);
    ordered
}
