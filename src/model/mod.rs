//! # Catalog Model
//!
//! The input representation: a saved-object export from Tabletop Simulator.
//! Only the parts needed to find card artwork are modelled. A deck export
//! looks like this (abridged):
//!
//! ```text
//! { "ObjectStates": [ {
//!     "CustomDeck": { "1": { "FaceURL": "...", "BackURL": "..." } },
//!     "ContainedObjects": [ { "CardID": 100, "Nickname": "Goblin" }, ... ]
//! } ] }
//! ```
//!
//! A card's deck is `CardID / 100`; the remainder indexes into the deck's
//! sprite sheet, which this tool does not slice. Each card therefore prints
//! its deck's whole face image.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ProxyError;

/// One printable card, resolved against its deck's artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEntry {
    pub id: i64,
    pub face_ref: String,
    pub back_ref: String,
    /// The card's nickname, or empty.
    pub label: String,
}

/// Face and back artwork shared by every card in a deck.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeckUrls {
    #[serde(rename = "FaceURL", alias = "faceURL")]
    pub face_url: String,
    #[serde(rename = "BackURL", alias = "backURL")]
    pub back_url: String,
}

/// Deck index to artwork. Keys arrive as decimal strings in the export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "HashMap<String, DeckUrls>")]
pub struct DeckUrlMap(pub HashMap<i64, DeckUrls>);

impl DeckUrlMap {
    pub fn get(&self, deck_index: i64) -> Option<&DeckUrls> {
        self.0.get(&deck_index)
    }
}

impl TryFrom<HashMap<String, DeckUrls>> for DeckUrlMap {
    type Error = String;

    fn try_from(value: HashMap<String, DeckUrls>) -> Result<Self, Self::Error> {
        let mut map = HashMap::with_capacity(value.len());
        for (key, urls) in value {
            let index: i64 = key
                .trim()
                .parse()
                .map_err(|_| format!("CustomDeck key '{}' is not an integer", key))?;
            map.insert(index, urls);
        }
        Ok(DeckUrlMap(map))
    }
}

/// Top level of a saved-object export.
#[derive(Debug, Deserialize)]
pub struct SavedObject {
    #[serde(rename = "ObjectStates", alias = "objectStates")]
    pub object_states: Vec<ObjectState>,
}

/// A deck object: its artwork table and the cards it contains, in order.
#[derive(Debug, Deserialize)]
pub struct ObjectState {
    #[serde(rename = "CustomDeck", alias = "customDeck")]
    pub custom_deck: DeckUrlMap,
    #[serde(rename = "ContainedObjects", alias = "containedObjects")]
    pub contained_objects: Vec<ContainedObject>,
}

#[derive(Debug, Deserialize)]
pub struct ContainedObject {
    #[serde(rename = "CardID", alias = "cardID")]
    pub card_id: i64,
    #[serde(rename = "Nickname", alias = "nickname", default)]
    pub nickname: Option<String>,
}

/// Deck index encoded in a card ID.
pub fn deck_index(card_id: i64) -> i64 {
    card_id.div_euclid(100)
}

/// Parse an export and flatten it into printable cards, in containment order.
///
/// Cards whose deck is missing from `CustomDeck` are dropped without error.
pub fn parse_catalog(json: &str) -> Result<Vec<CardEntry>, ProxyError> {
    let saved: SavedObject = serde_json::from_str(json)?;
    let state = saved
        .object_states
        .into_iter()
        .next()
        .ok_or_else(|| ProxyError::Catalog("ObjectStates is empty".to_string()))?;

    let total = state.contained_objects.len();
    let mut cards = Vec::with_capacity(total);
    for obj in state.contained_objects {
        let deck = deck_index(obj.card_id);
        match state.custom_deck.get(deck) {
            Some(urls) => cards.push(CardEntry {
                id: obj.card_id,
                face_ref: urls.face_url.clone(),
                back_ref: urls.back_url.clone(),
                label: obj.nickname.unwrap_or_default(),
            }),
            None => {
                log::debug!(
                    "Dropping card {} ({:?}): deck {} not in CustomDeck",
                    obj.card_id,
                    obj.nickname.as_deref().unwrap_or(""),
                    deck
                );
            }
        }
    }

    if cards.len() < total {
        log::debug!("{} of {} cards had no deck artwork", total - cards.len(), total);
    }
    Ok(cards)
}
