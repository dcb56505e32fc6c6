mod normalizer;
