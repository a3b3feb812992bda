mod fetch;
mod parse;

pub use fetch::{EpisodeQuery, SortOrder, episode_url, episodes_url, fetch_episode, fetch_episodes};
pub use parse::{parse_episode, parse_episode_list, parse_published_at};
