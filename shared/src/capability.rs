//! Analysis capabilities: one instruction template plus one schema pair each.

use crate::schema::{FieldSpec, ObjectSchema};

/// Placeholder marking where the photo is interpolated into an instruction.
pub const MEDIA_PLACEHOLDER: &str = "{{media}}";

/// Input contract shared by every capability.
pub const PHOTO_INPUT: ObjectSchema = ObjectSchema::new(&[FieldSpec::string(
    "photoDataUri",
    "A photo of an animal's face, as a data URI that must include a MIME type and use Base64 \
     encoding. Expected format: 'data:<mimetype>;base64,<encoded_data>'",
)]);

const MOOD_FIELD: FieldSpec = FieldSpec::string(
    "mood",
    "A short, descriptive sentence about the animal's real expression or mood.",
);

const SYMBOL_FIELD: FieldSpec = FieldSpec::string(
    "symbol",
    "A single emoji representing the animal's expression or mood.",
);

/// A named analysis variant.
#[derive(Debug)]
pub struct Capability {
    pub name: &'static str,
    pub instruction: &'static str,
    pub input: ObjectSchema,
    pub output: ObjectSchema,
}

/// Realistic single-sentence description, no emoji.
pub static EXPRESSION: Capability = Capability {
    name: "expression",
    instruction: "You are an AI that analyzes a picture of an animal. Your task is to:
1. Observe the animal's facial features, posture, and the context of the image.
2. Describe its real expression or mood in a short, single, descriptive sentence.

If a face is not clearly visible, make a best guess based on the animal's posture or the overall context of the image. Do not use emojis. Focus on a realistic interpretation.

Here is the animal's photo: {{media}}
",
    input: PHOTO_INPUT,
    output: ObjectSchema::new(&[MOOD_FIELD]),
};

/// Mood sentence plus a matching emoji.
pub static MOOD_EMOJI: Capability = Capability {
    name: "mood-emoji",
    instruction: "You are an AI that analyzes a picture of an animal. Your task is to:
1. Observe the animal's facial features, posture, and the context of the image.
2. Describe its real expression or mood in a short, single, descriptive sentence.
3. Pick the one emoji that best represents that expression or mood.

If a face is not clearly visible, make a best guess based on the animal's posture or the overall context of the image.

Here is the animal's photo: {{media}}
",
    input: PHOTO_INPUT,
    output: ObjectSchema::new(&[MOOD_FIELD, SYMBOL_FIELD]),
};

/// Emoji with a short, fun comment explaining the pick.
pub static EMOJI_COMMENT: Capability = Capability {
    name: "emoji-comment",
    instruction: "You are an AI that analyzes a picture of a pet. Your task is to:
1. Name its expression or general mood in a few words.
2. Return an emoji that best represents that expression or mood.
3. Provide a short, fun, single-sentence comment explaining the emoji choice.

If a face is not clearly visible, make a best guess based on the pet's posture or the overall context of the image.

Here is the pet's photo: {{media}}
",
    input: PHOTO_INPUT,
    output: ObjectSchema::new(&[
        FieldSpec::string("mood", "The pet's expression or mood in a few words."),
        SYMBOL_FIELD,
        FieldSpec::string(
            "commentary",
            "A short, fun comment about the pet's expression or mood.",
        ),
    ]),
};

/// Every capability the service exposes.
pub static ALL: [&Capability; 3] = [&EXPRESSION, &MOOD_EMOJI, &EMOJI_COMMENT];

impl Capability {
    /// Look up a capability by its route name.
    pub fn by_name(name: &str) -> Option<&'static Capability> {
        ALL.iter().copied().find(|capability| capability.name == name)
    }

    /// Capability used when none is requested.
    pub fn default_capability() -> &'static Capability {
        &MOOD_EMOJI
    }
}
