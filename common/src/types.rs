//! Type signatures describing how operator input maps onto contract calls

use std::fmt::{self, Display};

/// The type a single CLI token is coerced into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// A boolean, parsed according to the descriptor's [`BoolMode`]
    Bool,
    /// An unsigned base-10 integer of at most 256 bits
    Integer,
    /// A 20-byte account or contract address
    Address,
    /// A free-form string, passed through verbatim
    String,
}

impl Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Bool => write!(f, "bool"),
            ParamType::Integer => write!(f, "integer"),
            ParamType::Address => write!(f, "address"),
            ParamType::String => write!(f, "string"),
        }
    }
}

/// How boolean tokens are interpreted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoolMode {
    /// Only the exact tokens `true` and `false` are accepted
    #[default]
    Literal,
    /// The token must be a base-10 integer; any non-zero value is `true`
    IntegerTruthiness,
}

impl Display for BoolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolMode::Literal => write!(f, "true|false"),
            BoolMode::IntegerTruthiness => write!(f, "0|non-zero integer"),
        }
    }
}

/// Whether a descriptor takes an exact number of tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly one token per declared parameter
    Fixed,
    /// All declared parameters but the last are fixed; the last one is
    /// repeated over every remaining token, producing one call per token
    Variadic,
}

/// The type signature of a setting or command, used to coerce raw tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SettingDescriptor {
    /// The name the operator refers to the setting by
    pub name: &'static str,
    /// The declared parameter types, in token order
    pub params: &'static [ParamType],
    /// Whether the last parameter repeats
    pub arity: Arity,
    /// How boolean parameters are parsed
    pub bool_mode: BoolMode,
    /// For variadic descriptors, the index among the call arguments at which
    /// each variadic value is inserted
    pub variadic_position: usize,
}

impl SettingDescriptor {
    /// A descriptor taking exactly one token per parameter
    pub const fn fixed(name: &'static str, params: &'static [ParamType]) -> Self {
        Self {
            name,
            params,
            arity: Arity::Fixed,
            bool_mode: BoolMode::Literal,
            variadic_position: 0,
        }
    }

    /// A descriptor whose last parameter repeats, each repetition becoming a
    /// separate call with the value inserted at `variadic_position`
    pub const fn variadic(
        name: &'static str,
        params: &'static [ParamType],
        variadic_position: usize,
    ) -> Self {
        Self {
            name,
            params,
            arity: Arity::Variadic,
            bool_mode: BoolMode::Literal,
            variadic_position,
        }
    }

    /// Override the boolean parsing mode
    pub const fn with_bool_mode(mut self, bool_mode: BoolMode) -> Self {
        self.bool_mode = bool_mode;
        self
    }

    /// The parameters that consume exactly one token each
    pub fn fixed_params(&self) -> &'static [ParamType] {
        match self.arity {
            Arity::Fixed => self.params,
            Arity::Variadic => &self.params[..self.params.len().saturating_sub(1)],
        }
    }

    /// The parameter applied to every trailing token, if any
    pub fn variadic_param(&self) -> Option<ParamType> {
        match self.arity {
            Arity::Fixed => None,
            Arity::Variadic => self.params.last().copied(),
        }
    }

    /// Whether `n` tokens satisfy this descriptor's arity
    pub fn accepts_count(&self, n: usize) -> bool {
        let fixed = self.fixed_params().len();
        match self.arity {
            Arity::Fixed => n == fixed,
            Arity::Variadic => n >= fixed,
        }
    }

    /// A human-readable description of the accepted token count
    pub fn expected_count(&self) -> String {
        let fixed = self.fixed_params().len();
        match self.arity {
            Arity::Fixed => format!("exactly {fixed}"),
            Arity::Variadic => format!("at least {fixed}"),
        }
    }

    /// A usage string listing the parameter types, e.g. `<integer> <address>...`
    pub fn usage(&self) -> String {
        let mut parts: Vec<String> = self
            .fixed_params()
            .iter()
            .map(|p| self.param_usage(*p))
            .collect();
        if let Some(p) = self.variadic_param() {
            parts.push(format!("{}...", self.param_usage(p)));
        }
        parts.join(" ")
    }

    /// The usage fragment for a single parameter
    fn param_usage(&self, param: ParamType) -> String {
        match param {
            ParamType::Bool => format!("<{}>", self.bool_mode),
            other => format!("<{other}>"),
        }
    }
}

/// The contracts the scripts know how to administer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContractName {
    /// Admin-only operations on node operators
    RocketAdmin,
    /// Deposit settings
    RocketDepositSettings,
    /// Group registration and accessor creation
    RocketGroupAPI,
    /// Group settings, including the registration fee
    RocketGroupSettings,
    /// A single group, created at runtime
    RocketGroupContract,
    /// A group's deposit accessor, created at runtime
    RocketGroupAccessorContract,
    /// Minipool settings
    RocketMinipoolSettings,
    /// Node settings
    RocketNodeSettings,
    /// The RPL token
    RocketPoolToken,
}

impl ContractName {
    /// Every known contract
    pub const ALL: [ContractName; 9] = [
        ContractName::RocketAdmin,
        ContractName::RocketDepositSettings,
        ContractName::RocketGroupAPI,
        ContractName::RocketGroupSettings,
        ContractName::RocketGroupContract,
        ContractName::RocketGroupAccessorContract,
        ContractName::RocketMinipoolSettings,
        ContractName::RocketNodeSettings,
        ContractName::RocketPoolToken,
    ];

    /// The name of the contract's build artifact
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractName::RocketAdmin => "RocketAdmin",
            ContractName::RocketDepositSettings => "RocketDepositSettings",
            ContractName::RocketGroupAPI => "RocketGroupAPI",
            ContractName::RocketGroupSettings => "RocketGroupSettings",
            ContractName::RocketGroupContract => "RocketGroupContract",
            ContractName::RocketGroupAccessorContract => "RocketGroupAccessorContract",
            ContractName::RocketMinipoolSettings => "RocketMinipoolSettings",
            ContractName::RocketNodeSettings => "RocketNodeSettings",
            ContractName::RocketPoolToken => "RocketPoolToken",
        }
    }

    /// Look up a contract by its artifact name
    pub fn from_artifact_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.artifact_name() == name)
    }
}

impl Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.artifact_name())
    }
}
