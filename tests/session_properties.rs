//! Property tests for the study session engine
//!
//! - Progress bound: every streak stays in 0..=3
//! - Mastery removal: a card is in the active pool iff its streak is below 3
//! - Convergence: answering correctly empties the pool within 3 × N answers
//! - Reset: streaks go back to the stored progress of each card

use databank::{Card, MASTERED_STREAK, StudySession};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

#[derive(Debug, Clone, Copy)]
enum Op {
    Flip,
    Answer(bool),
    Shuffle,
    ChangeDirection,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::Flip),
        6 => any::<bool>().prop_map(Op::Answer),
        1 => Just(Op::Shuffle),
        1 => Just(Op::ChangeDirection),
    ]
}

/// Distinct pairs whose stored progress is below mastery
fn arb_cards() -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(proptest::option::of(0u8..MASTERED_STREAK), 1..12).prop_map(
        |progress| {
            progress
                .into_iter()
                .enumerate()
                .map(|(i, p)| Card {
                    progress: p,
                    ..Card::new(format!("Wort {i}"), format!("word {i}"))
                })
                .collect()
        },
    )
}

fn apply(session: &mut StudySession, op: Op) {
    match op {
        Op::Flip => session.flip(),
        Op::Answer(is_correct) => {
            session.answer(is_correct);
        }
        Op::Shuffle => session.shuffle_remaining(),
        Op::ChangeDirection => session.change_direction(),
    }
}

fn active_iff_not_mastered(session: &StudySession) -> bool {
    session
        .source_cards()
        .iter()
        .zip(session.card_progress())
        .all(|(card, streak)| {
            let active = session.active_cards().iter().any(|c| c.same_pair(card));
            active == (*streak < MASTERED_STREAK)
        })
}

proptest! {
    #[test]
    fn streaks_stay_in_range(
        cards in arb_cards(),
        ops in prop::collection::vec(arb_op(), 0..80),
        seed in any::<u64>(),
    ) {
        let mut session = StudySession::with_rng(cards, StdRng::seed_from_u64(seed));
        for op in ops {
            apply(&mut session, op);
            prop_assert!(session.card_progress().iter().all(|s| *s <= MASTERED_STREAK));
            prop_assert_eq!(session.card_progress().len(), session.total());
        }
    }

    #[test]
    fn pool_holds_exactly_unmastered_cards(
        cards in arb_cards(),
        ops in prop::collection::vec(arb_op(), 0..80),
        seed in any::<u64>(),
    ) {
        let mut session = StudySession::with_rng(cards, StdRng::seed_from_u64(seed));
        prop_assert!(active_iff_not_mastered(&session));

        for op in ops {
            apply(&mut session, op);
            prop_assert!(active_iff_not_mastered(&session));
            if !session.is_complete() {
                prop_assert!(session.current_index() < session.remaining());
            }
        }
    }

    #[test]
    fn correct_answers_complete_the_session(cards in arb_cards(), seed in any::<u64>()) {
        let total = cards.len();
        let mut session = StudySession::with_rng(cards, StdRng::seed_from_u64(seed));

        let mut answers = 0;
        while !session.is_complete() {
            session.answer(true);
            answers += 1;
            prop_assert!(answers <= 3 * total);
        }
        prop_assert_eq!(session.mastered_count(), total);
    }

    #[test]
    fn reset_restores_stored_progress(
        cards in arb_cards(),
        ops in prop::collection::vec(arb_op(), 0..40),
        seed in any::<u64>(),
    ) {
        let expected: Vec<u8> = cards.iter().map(Card::streak).collect();
        let mut session = StudySession::with_rng(cards, StdRng::seed_from_u64(seed));

        for op in ops {
            apply(&mut session, op);
        }
        let direction = session.direction();
        session.reset();

        prop_assert_eq!(session.card_progress(), expected.as_slice());
        prop_assert_eq!(session.remaining(), session.total());
        prop_assert_eq!(session.current_index(), 0);
        prop_assert!(!session.is_flipped());
        prop_assert_eq!(session.direction(), direction);
    }
}
