use crate::domain::generation::GenerationRequest;
use crate::infrastructure::llm::Prompt;

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub fn title(request: &GenerationRequest) -> Prompt {
    Prompt::new(
        "You are a social media copywriter who writes high-converting Facebook post titles.",
        format!(
            "Write an attention-grabbing Facebook post title.\n\n\
             Topic: {}\n\
             Target audience: {}\n\
             Post type: {}\n\
             Tone: {}\n\
             Use emoji: {}\n\n\
             Keep it under 50 characters and in the language of the topic.\n\
             Reply with the title only.",
            request.topic,
            request.target_audience,
            request.post_type,
            request.tone,
            yes_no(request.include_emoji),
        ),
    )
}

pub fn content(request: &GenerationRequest) -> Prompt {
    Prompt::new(
        "You are a social media copywriter who writes high-converting Facebook posts \
         using storytelling and clear calls to action.",
        format!(
            "Write the body of a Facebook post.\n\n\
             Topic: {}\n\
             Target audience: {}\n\
             Post type: {}\n\
             Tone: {}\n\
             Maximum length: {} characters\n\
             Use emoji: {}\n\n\
             Open with a hook, give the reader something useful, and end with a clear call to action.\n\
             Reply with the post body only.",
            request.topic,
            request.target_audience,
            request.post_type,
            request.tone,
            request.max_length,
            yes_no(request.include_emoji),
        ),
    )
}

pub fn hashtags(request: &GenerationRequest) -> Prompt {
    Prompt::new(
        "You are a social media hashtag specialist.",
        format!(
            "Suggest 5-10 relevant Facebook hashtags.\n\n\
             Topic: {}\n\
             Target audience: {}\n\
             Post type: {}\n\n\
             Mix popular and niche tags and prefix each with #.\n\
             Reply as a comma-separated list, for example: #tag1, #tag2, #tag3",
            request.topic, request.target_audience, request.post_type,
        ),
    )
}

pub fn image_prompt(request: &GenerationRequest, content: &str) -> Prompt {
    Prompt::new(
        "You write prompts for AI image generators that illustrate social media posts.",
        format!(
            "Write a detailed image generation prompt for this Facebook post.\n\n\
             Topic: {}\n\
             Post: {}\n\
             Target audience: {}\n\
             Image style: {}\n\n\
             Describe style, colour and composition. Write the prompt in English \
             and do not ask for any text inside the image.\n\
             Reply with the prompt only.",
            request.topic, content, request.target_audience, request.image_style,
        ),
    )
}

pub fn engagement(request: &GenerationRequest, title: &str, content: &str, hashtags: &[String]) -> Prompt {
    Prompt::new(
        "You are a social media analyst who predicts Facebook post engagement.",
        format!(
            "Predict the engagement of this Facebook post.\n\n\
             Title: {}\n\
             Post: {}\n\
             Hashtags: {}\n\
             Target audience: {}\n\
             Post type: {}\n\n\
             Score each metric from 1 to 10 and reply with JSON only, for example:\n\
             {{\"likes\": 7.5, \"comments\": 6.0, \"shares\": 5.5, \"clicks\": 8.0, \"overall\": 7.0}}",
            title,
            content,
            hashtags.join(", "),
            request.target_audience,
            request.post_type,
        ),
    )
}

pub fn tips(title: &str, content: &str, hashtags: &[String], engagement: &str) -> Prompt {
    Prompt::new(
        "You are a social media consultant who improves Facebook post performance.",
        format!(
            "Give 3-5 concrete suggestions to improve this Facebook post.\n\n\
             Title: {}\n\
             Post: {}\n\
             Hashtags: {}\n\
             Predicted engagement: {}\n\n\
             Cover content, timing and interaction. One suggestion per line.",
            title,
            content,
            hashtags.join(", "),
            engagement,
        ),
    )
}
