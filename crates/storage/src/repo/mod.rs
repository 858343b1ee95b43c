mod commenters;
mod comments;
mod domains;
mod pages;
