//! Status and category enums with their display labels.
//!
//! Each enum serialises to a stable `snake_case` token (what the document
//! store holds) and exposes a French `label()` for screens, plus `ALL` in
//! display order for selection lists.

use serde::{Deserialize, Serialize};

/// Error returned when a status change is not allowed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot move {entity} from '{from}' to '{to}'")]
pub struct TransitionError {
    /// Kind of record being changed.
    pub entity: &'static str,
    /// Current status token.
    pub from: &'static str,
    /// Requested status token.
    pub to: &'static str,
}

/// Error returned when parsing an unknown status token.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Enum being parsed.
    pub kind: &'static str,
    /// Offending input.
    pub value: String,
}

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident : $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => ($token:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $token)] $variant, )+
        }

        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            /// Stable token stored in documents.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $token, )+
                }
            }

            /// Display label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $token => Ok(Self::$variant), )+
                    _ => Err(UnknownVariant { kind: $kind, value: s.to_owned() }),
                }
            }
        }
    };
}

labelled_enum! {
    /// Lifecycle of a supplier order.
    OrderStatus: "order status" {
        Nouvelle => ("nouvelle", "Nouvelle"),
        Commandee => ("commandee", "Commandée"),
        Recue => ("recue", "Reçue en magasin"),
        Livree => ("livree", "Livrée au client"),
        Annulee => ("annulee", "Annulée"),
    }
}

impl OrderStatus {
    /// Whether no further change is possible.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Livree | Self::Annulee)
    }

    /// Whether the order may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Nouvelle, Self::Commandee)
                | (Self::Commandee, Self::Recue)
                | (Self::Recue, Self::Livree)
                | (Self::Nouvelle | Self::Commandee | Self::Recue, Self::Annulee)
        )
    }

    /// Check a transition, returning a descriptive error when refused.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when `next` is not reachable from `self`.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "order",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

labelled_enum! {
    /// How fast a ticket must be handled.
    Urgency: "urgency" {
        Normale => ("normale", "Normale"),
        Urgente => ("urgente", "Urgente"),
        TresUrgente => ("tres_urgente", "Très urgente"),
    }
}

impl Urgency {
    /// Sort rank, lowest first: very urgent tickets come first.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::TresUrgente => 0,
            Self::Urgente => 1,
            Self::Normale => 2,
        }
    }
}

impl Default for Urgency {
    fn default() -> Self {
        Self::Normale
    }
}

labelled_enum! {
    /// Which ear a device or product is fitted to.
    EarSide: "ear side" {
        Droite => ("droite", "Oreille droite"),
        Gauche => ("gauche", "Oreille gauche"),
        Bilateral => ("bilateral", "Stéréo"),
    }
}

labelled_enum! {
    /// Who issued a reimbursement statement.
    DecompteKind: "decompte kind" {
        SecuriteSociale => ("securite_sociale", "Sécurité sociale"),
        Mutuelle => ("mutuelle", "Mutuelle"),
    }
}

labelled_enum! {
    /// Processing state of a reimbursement statement.
    DecompteStatus: "decompte status" {
        ATraiter => ("a_traiter", "À traiter"),
        Transmis => ("transmis", "Transmis"),
        Rembourse => ("rembourse", "Remboursé"),
        Rejete => ("rejete", "Rejeté"),
    }
}

impl DecompteStatus {
    /// Whether the decompte may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::ATraiter, Self::Transmis)
                | (Self::Transmis, Self::Rembourse)
                | (Self::ATraiter | Self::Transmis, Self::Rejete)
                | (Self::Rejete, Self::ATraiter)
        )
    }

    /// Check a transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when `next` is not reachable from `self`.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "decompte",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

labelled_enum! {
    /// Payment state of an invoice.
    InvoiceStatus: "invoice status" {
        Emise => ("emise", "Émise"),
        Partielle => ("partielle", "Partiellement réglée"),
        Payee => ("payee", "Réglée"),
        Annulee => ("annulee", "Annulée"),
    }
}

labelled_enum! {
    /// Lifecycle of a repair ticket.
    InterventionStatus: "intervention status" {
        Ouverte => ("ouverte", "Ouverte"),
        EnCours => ("en_cours", "En cours"),
        EnvoyeeFabricant => ("envoyee_fabricant", "Envoyée au fabricant"),
        Terminee => ("terminee", "Terminée"),
        Restituee => ("restituee", "Restituée au client"),
    }
}

impl InterventionStatus {
    /// Whether the intervention may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Ouverte, Self::EnCours)
                | (Self::EnCours, Self::EnvoyeeFabricant | Self::Terminee)
                | (Self::EnvoyeeFabricant, Self::EnCours)
                | (Self::Terminee, Self::Restituee)
        )
    }

    /// Check a transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when `next` is not reachable from `self`.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "intervention",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

labelled_enum! {
    /// Fault reported on a hearing aid.
    ProblemKind: "problem kind" {
        Panne => ("panne", "Ne fonctionne plus"),
        Sifflement => ("sifflement", "Sifflements / Larsen"),
        Gresillement => ("gresillement", "Grésillements"),
        Humidite => ("humidite", "Humidité"),
        Casse => ("casse", "Casse"),
        Embout => ("embout", "Embout / dôme"),
        Batterie => ("batterie", "Batterie / charge"),
        Autre => ("autre", "Autre"),
    }
}

labelled_enum! {
    /// Job of a collaborator.
    CollaboratorRole: "collaborator role" {
        Audioprothesiste => ("audioprothesiste", "Audioprothésiste"),
        Assistant => ("assistant", "Assistant(e)"),
        Technicien => ("technicien", "Technicien"),
        Responsable => ("responsable", "Responsable"),
    }
}
