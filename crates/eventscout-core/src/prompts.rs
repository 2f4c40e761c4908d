//! Prompt texts sent through the proxy.

use crate::extract::{BLOCK_END, BLOCK_START};

/// Number of venues the explorer asks for
pub const VENUE_COUNT: usize = 5;

/// First model turn shown in a fresh chat transcript
pub fn chat_greeting(city: &str) -> String {
    format!(
        "Hello! I can help you find coding workshops, hackathons, or tech communities in {}. \
         What are you looking for?",
        city
    )
}

/// Event-scout prompt; the reply is expected in the delimited block format.
pub fn event_search(city: &str) -> String {
    format!(
        r#"Act as a resourceful tech scout for the {city} startup and developer ecosystem.
Find a large and diverse list of upcoming technology events, hackathons, workshops
and meetups in {city} for the next 3 months.

Search strategy, run these queries:
- "site:linkedin.com/events technology {city} upcoming"
- "site:devfolio.co {city} hackathon"
- "site:meetup.com technology {city}"
- "tech conferences {city} upcoming"

Target: at least 15 distinct events.

Answer ONLY with blocks in exactly this format, one per event:

{start}
Title: <Event Name>
Date: <Event Date>
Location: <Specific Location or Venue>
Description: <Short summary>
Source: <Direct URL to the event page, starting with https://>
Tags: <comma separated tags>
Cost: <Free/Paid>
Certificate: <Yes or No>
{end}

Order by relevance."#,
        city = city,
        start = BLOCK_START,
        end = BLOCK_END,
    )
}

/// Detail-guide prompt for one event, answered in Markdown
pub fn event_details(title: &str, description: &str) -> String {
    format!(
        r#"I need a detailed guide for the following event:
Name: "{title}"
Context: "{description}"

Search for the official details and answer in Markdown covering:
1. **Overview**: What is this event?
2. **Benefits**: Certificates, swag, networking, food.
3. **Who Should Attend**: Target audience.
4. **How to Register**: Numbered step-by-step instructions.
5. **Deadlines & Costs**: Important dates and fees.
6. **Official Links**: Website or registration page URLs.

Write every link as a full clickable URL starting with https://."#,
        title = title,
        description = description,
    )
}

pub fn venue_recommendations() -> String {
    format!(
        "Recommend {} best co-working spaces and tech hubs in this area for developers. \
         Provide a brief description for each.",
        VENUE_COUNT
    )
}
