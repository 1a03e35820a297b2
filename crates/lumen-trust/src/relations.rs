//! Relationship reconciliation.
//!
//! A stored declaration `source → target` is seen from both of its ends, so
//! one real-world link can arrive as several observations. This module turns
//! those observations into display relations and derives which links are
//! mutually corroborated.
//!
//! Rules, by [`RelationKind`]:
//! 1. **Complementary** (`Employer`/`Employee`, ...): one relation per
//!    counterpart and type pair, confirmed iff the type and its complement
//!    were declared by opposite parties.
//! 2. **Symmetric** (`Spouse`, ...): shown only when both parties declared
//!    it, as a single mutual, confirmed entry. One-way declarations are
//!    suppressed.
//! 3. **Plain**: shown regardless of direction, one entry per counterpart
//!    and type, mutual when declared both ways, confirmed per the supplied
//!    [`ConfirmedIndex`].
//!
//! Rating letters, unknown types, self-references and malformed account
//! identifiers are dropped silently.

use std::collections::{BTreeMap, HashMap, HashSet};

use lumen_core::relation::{Category, RelationKind, RelationTables};
use lumen_core::types::{AccountId, Direction, RelationshipDeclaration};
use serde::Serialize;
use tracing::debug;

// ---------------------------------------------------------------------------
// ConfirmedIndex
// ---------------------------------------------------------------------------

type MarkKey = (AccountId, AccountId, String);

/// Set of confirmed relationship marks keyed by stored
/// `(source, target, relation_type)`.
///
/// Membership is symmetric: when a link is corroborated both of its
/// declarations are marked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmedIndex {
    marks: HashSet<MarkKey>,
}

impl ConfirmedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive marks from declarations.
    ///
    /// `(s → t, T)` is confirmed when `T` is symmetric and `(t → s, T)` was
    /// declared, or `T` is complementary with complement `C` and `(t → s, C)`
    /// was declared. Plain types are never confirmed by derivation.
    pub fn derive(declarations: &[RelationshipDeclaration], tables: &RelationTables) -> Self {
        let mut present: HashSet<MarkKey> = HashSet::new();
        for decl in declarations {
            let (Some(source), Some(target)) =
                (AccountId::parse(&decl.source), AccountId::parse(&decl.target))
            else {
                continue;
            };
            if source == target {
                continue;
            }
            match tables.resolve(&decl.relation_type) {
                Some(RelationKind::Rating(_)) | None => continue,
                Some(_) => {
                    present.insert((source, target, decl.relation_type.clone()));
                }
            }
        }

        let mut index = Self::new();
        for (source, target, relation_type) in &present {
            let corroborating = match tables.resolve(relation_type) {
                Some(RelationKind::Symmetric { .. }) => relation_type.as_str(),
                Some(RelationKind::Complementary { complement, .. }) => complement.as_str(),
                _ => continue,
            };
            let reverse = (target.clone(), source.clone(), corroborating.to_owned());
            if present.contains(&reverse) {
                index.insert(source.clone(), target.clone(), relation_type.clone());
            }
        }
        index
    }

    pub fn insert(&mut self, source: AccountId, target: AccountId, relation_type: String) {
        self.marks.insert((source, target, relation_type));
    }

    pub fn contains(&self, source: &AccountId, target: &AccountId, relation_type: &str) -> bool {
        // HashSet lookup needs an owned key; marks are small.
        self.marks
            .contains(&(source.clone(), target.clone(), relation_type.to_owned()))
    }

    /// Confirmed connection count per account: the number of distinct marks
    /// the account is the source of.
    pub fn connection_counts(&self) -> HashMap<AccountId, u32> {
        let mut counts: HashMap<AccountId, u32> = HashMap::new();
        for (source, _, _) in &self.marks {
            *counts.entry(source.clone()).or_default() += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Confirmed connection counts for every account appearing in
/// `declarations`. Accounts without confirmed links are absent.
pub fn connection_counts(
    declarations: &[RelationshipDeclaration],
    tables: &RelationTables,
) -> HashMap<AccountId, u32> {
    ConfirmedIndex::derive(declarations, tables).connection_counts()
}

// ---------------------------------------------------------------------------
// Display relations
// ---------------------------------------------------------------------------

/// One reconciled relation as seen from the viewing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    /// The counterpart account.
    pub other: AccountId,
    /// Relation type of the first observation.
    pub relation_type: String,
    pub category: Category,
    /// Direction of the first observation.
    pub direction: Direction,
    pub is_mutual: bool,
    pub is_confirmed: bool,
    #[serde(skip)]
    seq: usize,
}

/// Reconciled relations grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGroups {
    groups: BTreeMap<Category, Vec<Relation>>,
}

impl RelationGroups {
    /// Relations of one category, confirmed and mutual first.
    pub fn get(&self, category: Category) -> &[Relation] {
        self.groups.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty categories in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[Relation])> {
        self.groups.iter().map(|(c, rs)| (*c, rs.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn confirmed(&self) -> usize {
        self.groups.values().flatten().filter(|r| r.is_confirmed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// One declaration resolved relative to the viewing account.
struct Observation<'a> {
    seq: usize,
    source: AccountId,
    target: AccountId,
    other: AccountId,
    direction: Direction,
    relation_type: &'a str,
    kind: &'a RelationKind,
}

/// Reconciles the declarations touching one account.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'t> {
    tables: &'t RelationTables,
}

impl<'t> Reconciler<'t> {
    pub fn new(tables: &'t RelationTables) -> Self {
        Self { tables }
    }

    /// Reconcile `declarations` (both directions) for `account`.
    pub fn reconcile(
        &self,
        account: &AccountId,
        declarations: &'t [RelationshipDeclaration],
        confirmed: &ConfirmedIndex,
    ) -> RelationGroups {
        let observations = self.observe(account, declarations);

        // (direction, counterpart, type) triples present in the input.
        let present: HashSet<(Direction, &AccountId, &str)> = observations
            .iter()
            .map(|o| (o.direction, &o.other, o.relation_type))
            .collect();
        let declared_by_me = |other: &AccountId, ty: &str| present.contains(&(Direction::Outgoing, other, ty));
        let declared_by_them = |other: &AccountId, ty: &str| present.contains(&(Direction::Incoming, other, ty));

        let mut processed: HashSet<(&AccountId, &str, &str)> = HashSet::new();
        let mut groups: BTreeMap<Category, Vec<Relation>> = BTreeMap::new();

        for obs in &observations {
            let ty = obs.relation_type;
            let (category, is_mutual, is_confirmed) = match obs.kind {
                RelationKind::Complementary { complement, category } => {
                    let comp = complement.as_str();
                    let pair = if ty <= comp { (ty, comp) } else { (comp, ty) };
                    if !processed.insert((&obs.other, pair.0, pair.1)) {
                        continue;
                    }
                    let satisfied = (declared_by_me(&obs.other, ty) && declared_by_them(&obs.other, comp))
                        || (declared_by_them(&obs.other, ty) && declared_by_me(&obs.other, comp));
                    (*category, satisfied, satisfied)
                }
                RelationKind::Symmetric { category } => {
                    let mutual = declared_by_me(&obs.other, ty) && declared_by_them(&obs.other, ty);
                    if !mutual || !processed.insert((&obs.other, ty, ty)) {
                        continue;
                    }
                    (*category, true, true)
                }
                RelationKind::Plain { category } => {
                    if !processed.insert((&obs.other, ty, ty)) {
                        continue;
                    }
                    let mutual = declared_by_me(&obs.other, ty) && declared_by_them(&obs.other, ty);
                    let marked = confirmed.contains(&obs.source, &obs.target, ty)
                        || (mutual && confirmed.contains(&obs.target, &obs.source, ty));
                    (*category, mutual, marked)
                }
                RelationKind::Rating(_) => continue,
            };

            groups.entry(category).or_default().push(Relation {
                other: obs.other.clone(),
                relation_type: ty.to_owned(),
                category,
                direction: obs.direction,
                is_mutual,
                is_confirmed,
                seq: obs.seq,
            });
        }

        for relations in groups.values_mut() {
            relations.sort_by_key(|r| (!(r.is_confirmed || r.is_mutual), r.seq));
        }

        RelationGroups { groups }
    }

    /// Resolve declarations against the viewing account and the tables,
    /// dropping everything that cannot be displayed.
    fn observe(
        &self,
        account: &AccountId,
        declarations: &'t [RelationshipDeclaration],
    ) -> Vec<Observation<'t>> {
        let mut observations = Vec::with_capacity(declarations.len());
        let mut dropped = 0usize;

        for (seq, decl) in declarations.iter().enumerate() {
            let parsed = AccountId::parse(&decl.source).zip(AccountId::parse(&decl.target));
            let Some((source, target)) = parsed else {
                dropped += 1;
                continue;
            };
            let other = match decl.direction {
                Direction::Outgoing if &source == account => target.clone(),
                Direction::Incoming if &target == account => source.clone(),
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            if &other == account {
                dropped += 1;
                continue;
            }
            let kind = match self.tables.resolve(&decl.relation_type) {
                Some(RelationKind::Rating(_)) => continue,
                Some(kind) => kind,
                None => {
                    dropped += 1;
                    continue;
                }
            };
            observations.push(Observation {
                seq,
                source,
                target,
                other,
                direction: decl.direction,
                relation_type: decl.relation_type.as_str(),
                kind,
            });
        }

        if dropped > 0 {
            debug!(%account, dropped, "relations: skipped undisplayable declarations");
        }
        observations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::types::Direction::{Incoming, Outgoing};

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn raw(seed: char) -> String {
        format!("G{}", seed.to_string().repeat(55))
    }

    fn id(seed: char) -> AccountId {
        AccountId::parse(&raw(seed)).unwrap()
    }

    /// A declaration `source → target` as seen by `viewer`.
    fn decl(source: char, target: char, ty: &str, viewer: char) -> RelationshipDeclaration {
        let direction = if viewer == source { Outgoing } else { Incoming };
        RelationshipDeclaration::new(raw(source), raw(target), ty, direction)
    }

    fn reconcile(viewer: char, decls: &[RelationshipDeclaration]) -> RelationGroups {
        let tables = RelationTables::default();
        let confirmed = ConfirmedIndex::derive(decls, &tables);
        Reconciler::new(&tables).reconcile(&id(viewer), decls, &confirmed)
    }

    // -------------------------------------------------------------------------
    // Complementary pairs
    // -------------------------------------------------------------------------

    #[test]
    fn complementary_pair_collapses_to_one_confirmed_relation() {
        let decls = [decl('A', 'B', "PartOf", 'A'), decl('B', 'A', "MyPart", 'A')];
        let groups = reconcile('A', &decls);

        let network = groups.get(Category::Network);
        assert_eq!(network.len(), 1);
        assert!(network[0].is_confirmed);
        assert_eq!(network[0].other, id('B'));
        assert_eq!(network[0].relation_type, "PartOf");
        assert_eq!(groups.total(), 1);
    }

    #[test]
    fn complementary_pair_seen_from_other_side() {
        let decls = [decl('A', 'B', "Employer", 'B'), decl('B', 'A', "Employee", 'B')];
        let groups = reconcile('B', &decls);
        let work = groups.get(Category::Work);
        assert_eq!(work.len(), 1);
        assert!(work[0].is_confirmed);
        assert_eq!(work[0].direction, Incoming);
    }

    #[test]
    fn one_sided_complementary_is_shown_unconfirmed() {
        let decls = [decl('A', 'B', "Guardian", 'A')];
        let family = reconcile('A', &decls).get(Category::Family).to_vec();
        assert_eq!(family.len(), 1);
        assert!(!family[0].is_confirmed);
        assert!(!family[0].is_mutual);
    }

    #[test]
    fn both_halves_declared_by_same_party_stay_unconfirmed() {
        let decls = [decl('A', 'B', "Owner", 'A'), decl('A', 'B', "OwnershipFull", 'A')];
        let ownership = reconcile('A', &decls).get(Category::Ownership).to_vec();
        assert_eq!(ownership.len(), 1);
        assert!(!ownership[0].is_confirmed);
    }

    #[test]
    fn same_type_both_ways_is_not_a_complement() {
        let decls = [decl('A', 'B', "Employer", 'A'), decl('B', 'A', "Employer", 'A')];
        let work = reconcile('A', &decls).get(Category::Work).to_vec();
        assert_eq!(work.len(), 1);
        assert!(!work[0].is_confirmed);
    }

    // -------------------------------------------------------------------------
    // Symmetric types
    // -------------------------------------------------------------------------

    #[test]
    fn lone_symmetric_declaration_is_suppressed() {
        let decls = [decl('A', 'B', "FactionMember", 'A')];
        let groups = reconcile('A', &decls);
        assert!(groups.get(Category::Social).is_empty());
        assert!(groups.is_empty());
    }

    #[test]
    fn reciprocal_symmetric_yields_one_mutual_relation() {
        let decls = [decl('A', 'B', "FactionMember", 'A'), decl('B', 'A', "FactionMember", 'A')];
        let social = reconcile('A', &decls).get(Category::Social).to_vec();
        assert_eq!(social.len(), 1);
        assert!(social[0].is_mutual);
        assert!(social[0].is_confirmed);
    }

    #[test]
    fn lone_incoming_symmetric_is_suppressed() {
        let decls = [decl('B', 'A', "Spouse", 'A')];
        assert!(reconcile('A', &decls).is_empty());
    }

    // -------------------------------------------------------------------------
    // Plain types
    // -------------------------------------------------------------------------

    #[test]
    fn plain_shown_in_either_direction() {
        let decls = [decl('A', 'B', "Love", 'A'), decl('C', 'A', "Sympathy", 'A')];
        let family = reconcile('A', &decls).get(Category::Family).to_vec();
        assert_eq!(family.len(), 2);
        assert!(family.iter().all(|r| !r.is_mutual && !r.is_confirmed));
    }

    #[test]
    fn plain_reciprocal_is_one_mutual_entry() {
        let decls = [decl('A', 'B', "Love", 'A'), decl('B', 'A', "Love", 'A')];
        let family = reconcile('A', &decls).get(Category::Family).to_vec();
        assert_eq!(family.len(), 1);
        assert!(family[0].is_mutual);
        assert!(!family[0].is_confirmed, "plain types are not confirmed by derivation");
    }

    #[test]
    fn plain_confirmation_comes_from_supplied_index() {
        let tables = RelationTables::default();
        let decls = [decl('A', 'B', "RecommendToMTLA", 'A')];
        let mut confirmed = ConfirmedIndex::new();
        confirmed.insert(id('A'), id('B'), "RecommendToMTLA".into());

        let groups = Reconciler::new(&tables).reconcile(&id('A'), &decls, &confirmed);
        let network = groups.get(Category::Network);
        assert_eq!(network.len(), 1);
        assert!(network[0].is_confirmed);
        assert!(!network[0].is_mutual);
    }

    // -------------------------------------------------------------------------
    // Filtering and ordering
    // -------------------------------------------------------------------------

    #[test]
    fn ratings_unknown_types_and_bad_ids_are_dropped() {
        let decls = [
            decl('A', 'B', "A", 'A'),
            decl('A', 'B', "Nemesis", 'A'),
            RelationshipDeclaration::new("garbage", raw('A'), "Love", Incoming),
            decl('A', 'A', "Love", 'A'),
        ];
        assert!(reconcile('A', &decls).is_empty());
    }

    #[test]
    fn declarations_not_touching_viewer_are_dropped() {
        let decls = [RelationshipDeclaration::new(raw('B'), raw('C'), "Love", Outgoing)];
        assert!(reconcile('A', &decls).is_empty());
    }

    #[test]
    fn confirmed_sort_first_and_ties_keep_input_order() {
        let decls = [
            decl('A', 'B', "Employer", 'A'),
            decl('A', 'C', "Contractor", 'A'),
            decl('A', 'D', "Employer", 'A'),
            decl('D', 'A', "Employee", 'A'),
            decl('A', 'E', "Partnership", 'A'),
            decl('E', 'A', "Partnership", 'A'),
        ];
        let work = reconcile('A', &decls).get(Category::Work).to_vec();
        let others: Vec<AccountId> = work.iter().map(|r| r.other.clone()).collect();
        assert_eq!(others, vec![id('D'), id('E'), id('B'), id('C')]);
    }

    #[test]
    fn custom_tables_are_honoured() {
        let tables = RelationTables::builder().plain("Neighbour", Category::Social).build();
        let decls = [decl('A', 'B', "Neighbour", 'A'), decl('A', 'C', "Love", 'A')];
        let groups = Reconciler::new(&tables).reconcile(&id('A'), &decls, &ConfirmedIndex::new());
        assert_eq!(groups.get(Category::Social).len(), 1);
        assert!(groups.get(Category::Family).is_empty());
    }

    // -------------------------------------------------------------------------
    // Confirmed index and connection counts
    // -------------------------------------------------------------------------

    #[test]
    fn derived_marks_are_symmetric() {
        let tables = RelationTables::default();
        let decls = [decl('A', 'B', "Employer", 'A'), decl('B', 'A', "Employee", 'B')];
        let index = ConfirmedIndex::derive(&decls, &tables);
        assert!(index.contains(&id('A'), &id('B'), "Employer"));
        assert!(index.contains(&id('B'), &id('A'), "Employee"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn one_way_declarations_are_not_marked() {
        let tables = RelationTables::default();
        let decls = [decl('A', 'B', "Spouse", 'A'), decl('A', 'C', "Love", 'A'), decl('C', 'A', "Love", 'C')];
        assert!(ConfirmedIndex::derive(&decls, &tables).is_empty());
    }

    #[test]
    fn connection_counts_per_source() {
        let tables = RelationTables::default();
        let decls = [
            decl('A', 'B', "Spouse", 'A'),
            decl('B', 'A', "Spouse", 'B'),
            decl('A', 'C', "MyPart", 'A'),
            decl('C', 'A', "PartOf", 'C'),
            decl('A', 'D', "FactionMember", 'A'),
            decl('A', 'B', "B", 'A'),
        ];
        let counts = connection_counts(&decls, &tables);
        assert_eq!(counts.get(&id('A')), Some(&2));
        assert_eq!(counts.get(&id('B')), Some(&1));
        assert_eq!(counts.get(&id('C')), Some(&1));
        assert_eq!(counts.get(&id('D')), None);
    }

    #[test]
    fn duplicate_indices_count_once() {
        let tables = RelationTables::default();
        let mut second = decl('A', 'B', "Spouse", 'A');
        second.relation_index = 1;
        let decls = [decl('A', 'B', "Spouse", 'A'), second, decl('B', 'A', "Spouse", 'B')];
        assert_eq!(connection_counts(&decls, &tables).get(&id('A')), Some(&1));
    }
}
