use rand::Rng;
use rand::seq::SliceRandom;

use super::SeedError;
use super::corpus::{Corpus, parse_corpus_date};
use crate::core::{Document, RecordId};
use crate::game::Game;

/// Per-user game count: `min` plus a uniform draw from `[0, span)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize {
    pub min: usize,
    pub span: usize,
}

impl BatchSize {
    pub fn new(min: usize, span: usize) -> Self {
        Self { min, span }
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.span == 0 {
            self.min
        } else {
            self.min + rng.gen_range(0..self.span)
        }
    }

    /// Smallest and largest value [`draw`](Self::draw) can return.
    pub fn bounds(&self) -> (usize, usize) {
        (self.min, self.min + self.span.saturating_sub(1))
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::new(5_000, 5_000)
    }
}

/// Samples `quantity` games for `owner` from the corpus templates.
pub fn generate_batch<R: Rng + ?Sized>(
    corpus: &Corpus,
    owner: RecordId,
    quantity: usize,
    rng: &mut R,
) -> Result<Vec<Document>, SeedError> {
    let mut batch = Vec::with_capacity(quantity);
    for _ in 0..quantity {
        let template = corpus
            .games
            .choose(rng)
            .ok_or_else(|| SeedError::corpus(corpus.games_path(), "no game objects to sample from"))?;
        let created = parse_corpus_date(&template.created).ok_or_else(|| {
            SeedError::corpus(
                corpus.games_path(),
                format!("unrecognised created date '{}'", template.created),
            )
        })?;

        let game = Game {
            id: None,
            points_gained: template.points_gained,
            win_status: template.win_status,
            game_type: template.game_type,
            created,
            user_id: owner,
        };
        batch.push(game.into_document());
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::USER_ID_FIELD;
    use crate::seed::corpus::GameTemplate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn template(created: &str) -> GameTemplate {
        GameTemplate {
            points_gained: 7,
            win_status: 1,
            game_type: 2,
            created: created.into(),
        }
    }

    #[test]
    fn draws_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let size = BatchSize::new(10, 5);
        let (low, high) = size.bounds();
        for _ in 0..500 {
            let n = size.draw(&mut rng);
            assert!((low..=high).contains(&n), "{n} outside [{low}, {high}]");
        }

        let fixed = BatchSize::new(10, 0);
        assert_eq!(fixed.draw(&mut rng), 10);
        assert_eq!(fixed.bounds(), (10, 10));
    }

    #[test]
    fn batch_games_belong_to_owner() {
        let corpus = Corpus::new(Vec::new(), vec![template("3-2-2021"), template("2/3/2021")]);
        let owner = RecordId::new();
        let mut rng = StdRng::seed_from_u64(1);

        let batch = generate_batch(&corpus, owner, 25, &mut rng).unwrap();
        assert_eq!(batch.len(), 25);
        assert!(batch.iter().all(|doc| doc.get_id(USER_ID_FIELD).unwrap() == owner));
    }

    #[test]
    fn unparseable_created_or_empty_templates_fail() {
        let mut rng = StdRng::seed_from_u64(1);

        let bad = Corpus::new(Vec::new(), vec![template("someday")]);
        assert!(matches!(
            generate_batch(&bad, RecordId::new(), 1, &mut rng),
            Err(SeedError::Corpus { .. })
        ));

        let empty = Corpus::new(Vec::new(), Vec::new());
        assert!(generate_batch(&empty, RecordId::new(), 0, &mut rng).unwrap().is_empty());
        assert!(generate_batch(&empty, RecordId::new(), 1, &mut rng).is_err());
    }
}
