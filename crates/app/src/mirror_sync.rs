//! Keeps mirror placements in step with list moves.
//!
//! When a card enters a list, every active mirror rule watching that list
//! (forward source side, or target side of a bidirectional rule) may add a
//! mirror placement on the other board. When a card leaves a source list,
//! the mirrors created for it are removed again.
//!
//! Each rule is applied in isolation: a failure is recorded in the returned
//! outcomes and logged, and the remaining rules still run.

use serde_json::json;

use kanflow_domain::audit::ActivityEntry;
use kanflow_domain::card::{Card, CardPlacement};
use kanflow_domain::error::{KanflowError, NotFoundError};
use kanflow_domain::id::{BoardId, CardId, MirrorRuleId, PlacementId, UserId};
use kanflow_domain::mirror::{MirrorRoute, MirrorRule};

use crate::ports::{
    AuditLog, BoardRepository, CardRepository, MirrorRuleRepository, PlacementRepository,
};

/// What one mirror rule did for a card entering a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    Created {
        rule_id: MirrorRuleId,
        placement: CardPlacement,
        source_removed: bool,
    },
    /// The card already had a mirror in the target list.
    AlreadyMirrored { rule_id: MirrorRuleId },
    ConditionNotMet { rule_id: MirrorRuleId },
    /// The rule names a list that does not exist on the target board.
    TargetListMissing {
        rule_id: MirrorRuleId,
        list_name: String,
    },
    Failed {
        rule_id: MirrorRuleId,
        error: String,
    },
}

impl MirrorOutcome {
    #[must_use]
    pub fn rule_id(&self) -> MirrorRuleId {
        match self {
            Self::Created { rule_id, .. }
            | Self::AlreadyMirrored { rule_id }
            | Self::ConditionNotMet { rule_id }
            | Self::TargetListMissing { rule_id, .. }
            | Self::Failed { rule_id, .. } => *rule_id,
        }
    }
}

/// Creates and removes mirror placements.
pub struct MirrorSynchronizer<MR, BR, CR, PR, AL> {
    rules: MR,
    boards: BR,
    cards: CR,
    placements: PR,
    audit: AL,
}

impl<MR, BR, CR, PR, AL> MirrorSynchronizer<MR, BR, CR, PR, AL>
where
    MR: MirrorRuleRepository + Sync,
    BR: BoardRepository + Sync,
    CR: CardRepository + Sync,
    PR: PlacementRepository + Sync,
    AL: AuditLog + Sync,
{
    pub fn new(rules: MR, boards: BR, cards: CR, placements: PR, audit: AL) -> Self {
        Self {
            rules,
            boards,
            cards,
            placements,
            audit,
        }
    }

    /// Apply every mirror rule triggered by the card entering `to_list_name`.
    ///
    /// `source_placement_id` is the placement that just entered the list; it
    /// is deleted after mirroring when a rule has `remove_from_source` set.
    ///
    /// # Errors
    ///
    /// Returns a storage error if loading the rules fails, or
    /// [`KanflowError::NotFound`] when rules apply but the card is gone.
    #[tracing::instrument(skip(self, user_id, source_placement_id))]
    pub async fn evaluate_mirror_rules(
        &self,
        card_id: CardId,
        board_id: BoardId,
        to_list_name: &str,
        user_id: Option<UserId>,
        source_placement_id: Option<PlacementId>,
    ) -> Result<Vec<MirrorOutcome>, KanflowError> {
        let mut rules = self.rules.find_by_source(board_id, to_list_name).await?;
        for rule in self
            .rules
            .find_bidirectional_by_target(board_id, to_list_name)
            .await?
        {
            if !rules.iter().any(|known| known.id == rule.id) {
                rules.push(rule);
            }
        }
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let card = self.cards.get_card(card_id).await?.ok_or_else(|| NotFoundError {
            entity: "Card",
            id: card_id.to_string(),
        })?;

        let mut outcomes = Vec::with_capacity(rules.len());
        for rule in &rules {
            let Some(route) = rule.route_from(board_id, to_list_name) else {
                continue;
            };
            let outcome = match self
                .apply(&card, &route, board_id, user_id, source_placement_id)
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(rule_id = %rule.id, error = %err, "mirror rule failed");
                    MirrorOutcome::Failed {
                        rule_id: rule.id,
                        error: err.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn apply(
        &self,
        card: &Card,
        route: &MirrorRoute<'_>,
        board_id: BoardId,
        user_id: Option<UserId>,
        source_placement_id: Option<PlacementId>,
    ) -> Result<MirrorOutcome, KanflowError> {
        let rule = route.rule;
        if !rule.condition_holds(card) {
            tracing::debug!(rule_id = %rule.id, "mirror condition not met");
            return Ok(MirrorOutcome::ConditionNotMet { rule_id: rule.id });
        }

        let Some(target) = self
            .boards
            .find_list_by_name(route.target_board_id, route.target_list_name)
            .await?
        else {
            tracing::warn!(
                rule_id = %rule.id,
                target_board_id = %route.target_board_id,
                list_name = route.target_list_name,
                "mirror target list not found"
            );
            return Ok(MirrorOutcome::TargetListMissing {
                rule_id: rule.id,
                list_name: route.target_list_name.to_string(),
            });
        };

        if self.placements.find_mirror(card.id, target.id).await?.is_some() {
            return Ok(MirrorOutcome::AlreadyMirrored { rule_id: rule.id });
        }
        let Some(placement) = self
            .placements
            .insert_mirror(CardPlacement::mirror(card.id, target.id, rule.id))
            .await?
        else {
            return Ok(MirrorOutcome::AlreadyMirrored { rule_id: rule.id });
        };

        let source_removed = match source_placement_id {
            Some(source) if rule.remove_from_source => self.placements.delete(source).await?,
            _ => false,
        };

        let logged = self
            .audit
            .append_activity(ActivityEntry::new(
                board_id,
                card.id,
                user_id,
                "card_mirrored",
                json!({
                    "mirror_rule_id": rule.id,
                    "target_board_id": route.target_board_id,
                    "target_list_name": route.target_list_name,
                    "reversed": route.reversed,
                    "source_removed": source_removed,
                }),
            ))
            .await;
        if let Err(err) = logged {
            tracing::error!(rule_id = %rule.id, error = %err, "failed to record mirror activity");
        }

        tracing::info!(
            rule_id = %rule.id,
            target_list = route.target_list_name,
            source_removed,
            "card mirrored"
        );
        Ok(MirrorOutcome::Created {
            rule_id: rule.id,
            placement,
            source_removed,
        })
    }

    /// Remove the mirrors a card left behind when leaving `from_list_name`.
    ///
    /// Every mirror placement of the card in each matching rule's target list
    /// is deleted, including mirrors another rule created; those are logged.
    ///
    /// Only rules whose source is `from_list_name` are considered. A card
    /// leaving the target endpoint of a bidirectional rule keeps the mirror
    /// the reverse route gave it on the source board.
    ///
    /// # Errors
    ///
    /// Returns a storage error if loading the rules fails.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_mirror_placements(
        &self,
        card_id: CardId,
        board_id: BoardId,
        from_list_name: &str,
    ) -> Result<Vec<CardPlacement>, KanflowError> {
        let rules = self.rules.find_by_source(board_id, from_list_name).await?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            for rule in self
                .rules
                .find_bidirectional_by_target(board_id, from_list_name)
                .await?
            {
                tracing::debug!(
                    rule_id = %rule.id,
                    "reverse-route mirrors are not cleaned up"
                );
            }
        }
        let mut removed = Vec::new();
        for rule in rules.iter().filter(|rule| rule.is_active) {
            match self.cleanup_rule(card_id, board_id, rule).await {
                Ok(mut placements) => removed.append(&mut placements),
                Err(err) => {
                    tracing::error!(rule_id = %rule.id, error = %err, "mirror cleanup failed");
                }
            }
        }
        Ok(removed)
    }

    async fn cleanup_rule(
        &self,
        card_id: CardId,
        board_id: BoardId,
        rule: &MirrorRule,
    ) -> Result<Vec<CardPlacement>, KanflowError> {
        let Some(target) = self
            .boards
            .find_list_by_name(rule.target_board_id, &rule.target_list_name)
            .await?
        else {
            tracing::warn!(
                rule_id = %rule.id,
                list_name = %rule.target_list_name,
                "mirror target list not found"
            );
            return Ok(Vec::new());
        };

        let removed = self.placements.delete_mirrors(card_id, target.id).await?;
        for placement in &removed {
            if placement.mirror_rule_id != Some(rule.id) {
                tracing::warn!(
                    rule_id = %rule.id,
                    placement_id = %placement.id,
                    created_by = ?placement.mirror_rule_id,
                    "removed mirror created by another rule"
                );
            }
        }
        if removed.is_empty() {
            return Ok(removed);
        }

        tracing::info!(rule_id = %rule.id, count = removed.len(), "mirrors removed");
        let placement_ids: Vec<PlacementId> = removed.iter().map(|p| p.id).collect();
        let logged = self
            .audit
            .append_activity(ActivityEntry::new(
                board_id,
                card_id,
                None,
                "mirror_removed",
                json!({
                    "mirror_rule_id": rule.id,
                    "target_board_id": rule.target_board_id,
                    "target_list_name": rule.target_list_name,
                    "placement_ids": placement_ids,
                }),
            ))
            .await;
        if let Err(err) = logged {
            tracing::error!(rule_id = %rule.id, error = %err, "failed to record mirror removal");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanflow_domain::board::List;
    use kanflow_domain::card::Priority;

    use crate::testing::InMemoryStore;

    type Synchronizer = MirrorSynchronizer<
        InMemoryStore,
        InMemoryStore,
        InMemoryStore,
        InMemoryStore,
        InMemoryStore,
    >;

    fn synchronizer(store: &InMemoryStore) -> Synchronizer {
        MirrorSynchronizer::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        )
    }

    struct Fixture {
        store: InMemoryStore,
        source: (BoardId, Vec<List>),
        target: (BoardId, Vec<List>),
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let (a, a_lists) = store.board("Design", &["Backlog", "Ready"]);
        let (b, b_lists) = store.board("Dev", &["Incoming", "Done"]);
        Fixture {
            store,
            source: (a.id, a_lists),
            target: (b.id, b_lists),
        }
    }

    #[tokio::test]
    async fn should_create_one_mirror_when_card_enters_source_list() {
        let f = fixture();
        let rule = MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming");
        f.store.add_mirror_rule(rule.clone());
        let (card, placement) = f.store.card_in(&f.source.1[1], Priority::Medium);
        let sync = synchronizer(&f.store);

        let outcomes = sync
            .evaluate_mirror_rules(card.id, f.source.0, "Ready", None, Some(placement.id))
            .await
            .unwrap();
        let again = sync
            .evaluate_mirror_rules(card.id, f.source.0, "Ready", None, Some(placement.id))
            .await
            .unwrap();

        assert!(matches!(outcomes[0], MirrorOutcome::Created { source_removed: false, .. }));
        assert!(matches!(again[0], MirrorOutcome::AlreadyMirrored { .. }));
        let mirrors = f.store.placements_in(f.target.1[0].id);
        assert_eq!(mirrors.len(), 1);
        assert!(mirrors[0].is_mirror);
        assert_eq!(mirrors[0].mirror_rule_id, Some(rule.id));
        assert_eq!(f.store.placements_in(f.source.1[1].id).len(), 1);
        assert_eq!(f.store.state().activity[0].action, "card_mirrored");
    }

    #[tokio::test]
    async fn should_append_mirror_after_existing_cards() {
        let f = fixture();
        f.store
            .add_mirror_rule(MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming"));
        f.store.card_in(&f.target.1[0], Priority::Medium);
        let (card, _) = f.store.card_in(&f.source.1[1], Priority::Medium);

        let outcomes = synchronizer(&f.store)
            .evaluate_mirror_rules(card.id, f.source.0, "Ready", None, None)
            .await
            .unwrap();

        let MirrorOutcome::Created { placement, .. } = &outcomes[0] else {
            panic!("expected a mirror, got {outcomes:?}");
        };
        assert_eq!(placement.position, 1);
    }

    #[tokio::test]
    async fn should_remove_source_placement_when_configured() {
        let f = fixture();
        f.store.add_mirror_rule(
            MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming").removing_source(),
        );
        let (card, placement) = f.store.card_in(&f.source.1[1], Priority::Medium);

        let outcomes = synchronizer(&f.store)
            .evaluate_mirror_rules(card.id, f.source.0, "Ready", None, Some(placement.id))
            .await
            .unwrap();

        assert!(matches!(outcomes[0], MirrorOutcome::Created { source_removed: true, .. }));
        assert!(f.store.placements_in(f.source.1[1].id).is_empty());
        assert_eq!(f.store.placements_in(f.target.1[0].id).len(), 1);
    }

    #[tokio::test]
    async fn should_skip_card_that_fails_condition() {
        let f = fixture();
        f.store.add_mirror_rule(
            MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming")
                .with_condition("priority", "high"),
        );
        let (card, _) = f.store.card_in(&f.source.1[1], Priority::Low);

        let outcomes = synchronizer(&f.store)
            .evaluate_mirror_rules(card.id, f.source.0, "Ready", None, None)
            .await
            .unwrap();

        assert!(matches!(outcomes[0], MirrorOutcome::ConditionNotMet { .. }));
        assert!(f.store.placements_in(f.target.1[0].id).is_empty());
    }

    #[tokio::test]
    async fn should_report_missing_target_list_and_continue() {
        let f = fixture();
        f.store
            .add_mirror_rule(MirrorRule::new(f.source.0, "Ready", f.target.0, "Nowhere"));
        f.store
            .add_mirror_rule(MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming"));
        let (card, _) = f.store.card_in(&f.source.1[1], Priority::Medium);

        let outcomes = synchronizer(&f.store)
            .evaluate_mirror_rules(card.id, f.source.0, "Ready", None, None)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            &outcomes[0],
            MirrorOutcome::TargetListMissing { list_name, .. } if list_name == "Nowhere"
        ));
        assert!(matches!(outcomes[1], MirrorOutcome::Created { .. }));
    }

    #[tokio::test]
    async fn should_mirror_back_through_bidirectional_rule() {
        let f = fixture();
        f.store.add_mirror_rule(
            MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming").bidirectional(),
        );
        let (card, _) = f.store.card_in(&f.target.1[0], Priority::Medium);

        let outcomes = synchronizer(&f.store)
            .evaluate_mirror_rules(card.id, f.target.0, "Incoming", None, None)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], MirrorOutcome::Created { .. }));
        assert_eq!(f.store.placements_in(f.source.1[1].id).len(), 1);
    }

    #[tokio::test]
    async fn should_mirror_from_both_endpoints_of_bidirectional_rule() {
        let f = fixture();
        let rule = MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming").bidirectional();
        f.store.add_mirror_rule(rule.clone());
        let (ready_card, _) = f.store.card_in(&f.source.1[1], Priority::Medium);
        let (incoming_card, _) = f.store.card_in(&f.target.1[0], Priority::Medium);
        let sync = synchronizer(&f.store);

        let forward = sync
            .evaluate_mirror_rules(ready_card.id, f.source.0, "Ready", None, None)
            .await
            .unwrap();
        let reverse = sync
            .evaluate_mirror_rules(incoming_card.id, f.target.0, "Incoming", None, None)
            .await
            .unwrap();

        assert_eq!(forward.len(), 1);
        assert_eq!(reverse.len(), 1);
        assert_eq!(forward[0].rule_id(), rule.id);
        assert_eq!(reverse[0].rule_id(), rule.id);
        let on_target: Vec<_> = f
            .store
            .placements_in(f.target.1[0].id)
            .into_iter()
            .filter(|p| p.is_mirror)
            .collect();
        let on_source: Vec<_> = f
            .store
            .placements_in(f.source.1[1].id)
            .into_iter()
            .filter(|p| p.is_mirror)
            .collect();
        assert_eq!(on_target.len(), 1);
        assert_eq!(on_target[0].card_id, ready_card.id);
        assert_eq!(on_source.len(), 1);
        assert_eq!(on_source[0].card_id, incoming_card.id);
    }

    #[tokio::test]
    async fn should_keep_reverse_route_mirror_when_card_leaves_target_list() {
        let f = fixture();
        f.store.add_mirror_rule(
            MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming").bidirectional(),
        );
        let (card, _) = f.store.card_in(&f.target.1[0], Priority::Medium);
        let sync = synchronizer(&f.store);
        sync.evaluate_mirror_rules(card.id, f.target.0, "Incoming", None, None)
            .await
            .unwrap();

        let removed = sync
            .cleanup_mirror_placements(card.id, f.target.0, "Incoming")
            .await
            .unwrap();

        assert!(removed.is_empty());
        assert_eq!(f.store.placements_in(f.source.1[1].id).len(), 1);
    }

    #[tokio::test]
    async fn should_not_mirror_back_through_forward_rule() {
        let f = fixture();
        f.store
            .add_mirror_rule(MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming"));
        let (card, _) = f.store.card_in(&f.target.1[0], Priority::Medium);

        let outcomes = synchronizer(&f.store)
            .evaluate_mirror_rules(card.id, f.target.0, "Incoming", None, None)
            .await
            .unwrap();

        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn should_fail_when_card_is_missing_and_rules_apply() {
        let f = fixture();
        f.store
            .add_mirror_rule(MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming"));

        let err = synchronizer(&f.store)
            .evaluate_mirror_rules(CardId::new(), f.source.0, "Ready", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, KanflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_remove_mirrors_when_card_leaves_source_list() {
        let f = fixture();
        f.store
            .add_mirror_rule(MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming"));
        let (card, _) = f.store.card_in(&f.source.1[1], Priority::Medium);
        let sync = synchronizer(&f.store);
        sync.evaluate_mirror_rules(card.id, f.source.0, "Ready", None, None)
            .await
            .unwrap();

        let removed = sync
            .cleanup_mirror_placements(card.id, f.source.0, "Ready")
            .await
            .unwrap();

        assert_eq!(removed.len(), 1);
        assert!(f.store.placements_in(f.target.1[0].id).is_empty());
        let state = f.store.state();
        assert_eq!(state.activity.last().unwrap().action, "mirror_removed");
    }

    #[tokio::test]
    async fn should_remove_mirrors_created_by_other_rules_sharing_target() {
        let f = fixture();
        let (c, c_lists) = f.store.board("Ops", &["Queue"]);
        f.store
            .add_mirror_rule(MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming"));
        f.store
            .add_mirror_rule(MirrorRule::new(c.id, "Queue", f.target.0, "Incoming"));
        let (card, _) = f.store.card_in(&c_lists[0], Priority::Medium);
        let sync = synchronizer(&f.store);
        sync.evaluate_mirror_rules(card.id, c.id, "Queue", None, None)
            .await
            .unwrap();

        let removed = sync
            .cleanup_mirror_placements(card.id, f.source.0, "Ready")
            .await
            .unwrap();

        assert_eq!(removed.len(), 1);
    }

    #[tokio::test]
    async fn should_leave_primary_placements_alone_on_cleanup() {
        let f = fixture();
        f.store
            .add_mirror_rule(MirrorRule::new(f.source.0, "Ready", f.target.0, "Incoming"));
        let (card, _) = f.store.card_in(&f.target.1[0], Priority::Medium);

        let removed = synchronizer(&f.store)
            .cleanup_mirror_placements(card.id, f.source.0, "Ready")
            .await
            .unwrap();

        assert!(removed.is_empty());
        assert_eq!(f.store.placements_in(f.target.1[0].id).len(), 1);
    }
}
