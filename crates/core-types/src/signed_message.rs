use core::ops::Deref;

use derive_where::derive_where;

use crate::{Context, Signature};

/// A proposal or vote, along with the signature of its author.
///
/// Derefs to the message, so that its fields can be read directly.
#[derive_where(Clone, Debug, PartialEq, Eq, PartialOrd, Ord; Msg)]
pub struct SignedMessage<Ctx, Msg>
where
    Ctx: Context,
{
    /// Signed content
    pub message: Msg,

    /// Signature of the author over the content
    pub signature: Signature<Ctx>,
}

impl<Ctx, Msg> SignedMessage<Ctx, Msg>
where
    Ctx: Context,
{
    /// Pair a message with its signature.
    pub fn new(message: Msg, signature: Signature<Ctx>) -> Self {
        Self { message, signature }
    }

    /// Drop the signature.
    pub fn into_message(self) -> Msg {
        self.message
    }
}

impl<Ctx, Msg> Deref for SignedMessage<Ctx, Msg>
where
    Ctx: Context,
{
    type Target = Msg;

    fn deref(&self) -> &Self::Target {
        &self.message
    }
}
