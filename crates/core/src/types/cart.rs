//! Cart line items and the ordered cart sequence.
//!
//! [`Cart`] holds the pure mutation rules. Persistence and change
//! notification live in the `gomarket-cart` crate.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId, Quantity};

/// Errors raised when building a [`Cart`] from untrusted data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartDataError {
    /// The same product appears on more than one line.
    #[error("duplicate product id in cart: {0}")]
    DuplicateId(ProductId),
}

/// A product being added to the cart, before it has a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

/// One product line in the cart.
///
/// Field order is the stored JSON field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: Quantity,
}

impl CartItem {
    /// Price of the whole line (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

impl From<NewCartItem> for CartItem {
    fn from(item: NewCartItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity: Quantity::ONE,
        }
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended with quantity 1.
    Added,
    /// An existing line's quantity went up.
    Incremented(Quantity),
    /// An existing line's quantity went down.
    Decremented(Quantity),
    /// The line was removed.
    Removed,
    /// Nothing matched the id.
    Unchanged,
}

impl CartChange {
    /// Whether the cart contents differ from before the mutation.
    #[must_use]
    pub const fn is_changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Ordered cart lines. Insertion order is preserved and ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a product. An existing line gains one unit and keeps its position
    /// and fields; otherwise a new line is appended with quantity 1.
    pub fn add(&mut self, item: NewCartItem) -> CartChange {
        if let Some(line) = self.line_mut(&item.id) {
            line.quantity = line.quantity.incremented();
            return CartChange::Incremented(line.quantity);
        }
        self.items.push(CartItem::from(item));
        CartChange::Added
    }

    /// Add one unit to an existing line. Unknown ids are ignored.
    pub fn increment(&mut self, id: &ProductId) -> CartChange {
        self.line_mut(id).map_or(CartChange::Unchanged, |line| {
            line.quantity = line.quantity.incremented();
            CartChange::Incremented(line.quantity)
        })
    }

    /// Remove one unit from a line, dropping the line when it would reach 0.
    /// Unknown ids are ignored.
    pub fn decrement(&mut self, id: &ProductId) -> CartChange {
        let Some(pos) = self.position(id) else {
            return CartChange::Unchanged;
        };
        match self
            .items
            .get(pos)
            .and_then(|line| line.quantity.decremented())
        {
            Some(quantity) => {
                if let Some(line) = self.items.get_mut(pos) {
                    line.quantity = quantity;
                }
                CartChange::Decremented(quantity)
            }
            None => {
                self.items.remove(pos);
                CartChange::Removed
            }
        }
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|line| &line.id == id)
    }

    /// All lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|line| &line.id == id)
    }

    fn line_mut(&mut self, id: &ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|line| &line.id == id)
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartDataError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        for (i, line) in items.iter().enumerate() {
            if items.iter().skip(i + 1).any(|other| other.id == line.id) {
                return Err(CartDataError::DuplicateId(line.id.clone()));
            }
        }
        Ok(Self { items })
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
