// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! This module defines the closed enumerations used throughout the facility
//! graph: what flows through nodes and connections, what tags measure, and
//! which kinds of nodes and connections exist.

/// A macro for defining a category enum along with its name table, `Display`
/// and `FromStr` implementations.  The string given for each variant is the
/// name used in facility documents.
macro_rules! Category {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $text:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                $variant,
            )*
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// Returns the name used for the variant in facility documents.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $text,
                    )*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(
                        $text => Ok(Self::$variant),
                    )*
                    _ => Err(crate::Error::unknown_type(format!(
                        "Unknown {}: {}",
                        stringify!($name),
                        s
                    ))),
                }
            }
        }
    };
}

Category!(
    /// The substance or resource moving through a node or connection.
    ///
    /// `Unspecified` is used when the contents are not known or not
    /// meaningful, e.g. for a tag that measures run time.
    ContentsType {
        Unspecified => "Unspecified",
        UntreatedSewage => "UntreatedSewage",
        PrimaryEffluent => "PrimaryEffluent",
        SecondaryEffluent => "SecondaryEffluent",
        TertiaryEffluent => "TertiaryEffluent",
        TreatedSewage => "TreatedSewage",
        DrinkingWater => "DrinkingWater",
        PotableReuse => "PotableReuse",
        NonpotableReuse => "NonpotableReuse",
        Biogas => "Biogas",
        NaturalGas => "NaturalGas",
        GasBlend => "GasBlend",
        FatOilGrease => "FatOilGrease",
        PrimarySludge => "PrimarySludge",
        ThickenedPrimarySludge => "TPS",
        WasteActivatedSludge => "WasteActivatedSludge",
        ThickenedWasteActivatedSludge => "TWAS",
        Scum => "Scum",
        FoodWaste => "FoodWaste",
        SludgeBlend => "SludgeBlend",
        ThickenedSludgeBlend => "ThickenedSludgeBlend",
        Electricity => "Electricity",
        Brine => "Brine",
        Seawater => "Seawater",
        SurfaceWater => "SurfaceWater",
        Groundwater => "Groundwater",
        Stormwater => "Stormwater",
        Heat => "Heat",
        Oil => "Oil",
        Grease => "Grease",
        Air => "Air",
        Chemical => "Chemical",
        Coagulant => "Coagulant",
        Disinfectant => "Disinfectant",
        Deodorant => "Deodorant",
        IndustrialWastewater => "IndustrialWastewater",
        MunicipalWastewater => "MunicipalWastewater",
        DisinfectedEffluent => "DisinfectedEffluent",
        SolidWaste => "SolidWaste",
        PretreatedWater => "PretreatedWater",
        ProductWater => "ProductWater",
        ChlorinatedSeawater => "ChlorinatedSeawater",
        CoagulatedWater => "CoagulatedWater",
        FilterBackwash => "FilterBackwash",
        Filtrate => "Filtrate",
        WasteFilterBackwashSolids => "WFBS",
    }
);

impl Default for ContentsType {
    fn default() -> Self {
        Self::Unspecified
    }
}

Category!(
    /// The quantity a tag measures.
    TagType {
        Flow => "Flow",
        Volume => "Volume",
        Level => "Level",
        Pressure => "Pressure",
        Temperature => "Temperature",
        RunTime => "RunTime",
        RunStatus => "RunStatus",
        Vss => "VSS",
        Tss => "TSS",
        Tds => "TDS",
        Cod => "COD",
        Bod => "BOD",
        Ph => "pH",
        Conductivity => "Conductivity",
        Turbidity => "Turbidity",
        Rotation => "Rotation",
        Efficiency => "Efficiency",
        StateOfCharge => "StateOfCharge",
        InFlow => "InFlow",
        OutFlow => "OutFlow",
        NetFlow => "NetFlow",
        Speed => "Speed",
        Frequency => "Frequency",
        Current => "Current",
        Voltage => "Voltage",
        Concentration => "Concentration",
        SetPoint => "SetPoint",
    }
);

impl TagType {
    /// Returns true if readings of this type are not about any particular
    /// substance, so tags of this type need no contents.
    pub fn is_contentless(&self) -> bool {
        matches!(
            self,
            TagType::RunTime
                | TagType::RunStatus
                | TagType::Rotation
                | TagType::Efficiency
                | TagType::Speed
                | TagType::Frequency
        )
    }

    /// Returns true if this is one of the flow types.
    pub fn is_flow(&self) -> bool {
        matches!(
            self,
            TagType::Flow | TagType::InFlow | TagType::OutFlow | TagType::NetFlow
        )
    }

    /// Returns true if readings of the two types may be combined in a
    /// virtual tag.  All flow types are compatible with each other.
    pub fn is_compatible_with(&self, other: &TagType) -> bool {
        self == other || (self.is_flow() && other.is_flow())
    }
}

Category!(
    /// The kind of a node.
    ///
    /// `Network`, `Facility` and `ModularUnit` are composite: they contain
    /// nodes and connections of their own.
    NodeType {
        Network => "Network",
        Facility => "Facility",
        ModularUnit => "ModularUnit",
        Pump => "Pump",
        Tank => "Tank",
        Reservoir => "Reservoir",
        Battery => "Battery",
        Digestion => "Digestion",
        Cogeneration => "Cogeneration",
        Boiler => "Boiler",
        Clarification => "Clarification",
        Filtration => "Filtration",
        RoMembrane => "ROMembrane",
        Screening => "Screening",
        Conditioning => "Conditioning",
        Thickening => "Thickening",
        Aeration => "Aeration",
        Chlorination => "Chlorination",
        Disinfection => "Disinfection",
        UvSystem => "UVSystem",
        Flaring => "Flaring",
        Reactor => "Reactor",
        StaticMixer => "StaticMixer",
        Joint => "Joint",
        Reducer => "Reducer",
        Splitter => "Splitter",
    }
);

impl NodeType {
    /// Returns true if nodes of this type can contain child nodes and
    /// connections.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            NodeType::Network | NodeType::Facility | NodeType::ModularUnit
        )
    }
}

Category!(
    /// The kind of a connection.
    ConnectionType {
        Pipe => "Pipe",
        Wire => "Wire",
        Wireless => "Wireless",
        Delivery => "Delivery",
    }
);

impl ConnectionType {
    /// Returns the contents a connection of this type carries when a document
    /// doesn't say.  Only electrical connections have such a default.
    pub fn default_contents(&self) -> Option<ContentsType> {
        match self {
            ConnectionType::Wire | ConnectionType::Wireless => Some(ContentsType::Electricity),
            ConnectionType::Pipe | ConnectionType::Delivery => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ErrorKind};

    #[test]
    fn test_document_names() -> Result<(), Error> {
        assert_eq!("TPS".parse::<ContentsType>()?, ContentsType::ThickenedPrimarySludge);
        assert_eq!(ContentsType::WasteFilterBackwashSolids.to_string(), "WFBS");
        assert_eq!("pH".parse::<TagType>()?, TagType::Ph);
        assert_eq!("ROMembrane".parse::<NodeType>()?, NodeType::RoMembrane);
        assert_eq!(NodeType::UvSystem.to_string(), "UVSystem");
        assert_eq!("Wireless".parse::<ConnectionType>()?, ConnectionType::Wireless);

        for contents in ContentsType::ALL {
            assert_eq!(contents.as_str().parse::<ContentsType>()?, *contents);
        }
        for tag_type in TagType::ALL {
            assert_eq!(tag_type.as_str().parse::<TagType>()?, *tag_type);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_names() {
        assert!("Sludge"
            .parse::<ContentsType>()
            .is_err_and(|e| e == Error::unknown_type("Unknown ContentsType: Sludge")));
        assert!("Conduit"
            .parse::<ConnectionType>()
            .is_err_and(|e| e.kind() == ErrorKind::UnknownType));
        // names are case-sensitive
        assert!("pump".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_predicates() {
        assert!(NodeType::Facility.is_composite());
        assert!(!NodeType::Pump.is_composite());

        assert!(TagType::RunTime.is_contentless());
        assert!(!TagType::Flow.is_contentless());
        assert!(TagType::InFlow.is_compatible_with(&TagType::NetFlow));
        assert!(!TagType::Flow.is_compatible_with(&TagType::Level));

        assert_eq!(
            ConnectionType::Wire.default_contents(),
            Some(ContentsType::Electricity)
        );
        assert_eq!(ConnectionType::Pipe.default_contents(), None);
    }
}
